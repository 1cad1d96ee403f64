use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_shaalad");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn shaalad");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn login_principal(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>, workspace: &PathBuf) {
    let _ = request_ok(
        stdin,
        reader,
        "setup-1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "setup-2",
        "school.setup",
        json!({
            "schoolName": "जि.प. प्राथमिक शाळा, वाखरी",
            "udiseCode": "27310203401",
            "address": "वाखरी, ता. पंढरपूर",
            "pinCode": "413304",
            "phone": "0218622334",
            "principalName": "र. ग. देशमुख",
            "principalMobile": "9876543210"
        }),
    );
    let _ = request_ok(
        stdin,
        reader,
        "setup-3",
        "auth.login",
        json!({ "mobile": "9876543210", "password": "9876543210", "role": "principal" }),
    );
}

#[test]
fn holiday_and_event_coexist_on_one_date() {
    let workspace = temp_dir("shaala-calendar");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login_principal(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "calendar.addHoliday",
        json!({ "date": "2026-08-15", "name": "स्वातंत्र्य दिन" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "calendar.addEvent",
        json!({ "date": "2026-08-15", "title": "ध्वजारोहण", "description": "सकाळी ८ वाजता" }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "calendar.addHoliday",
        json!({ "date": "2026-01-26", "name": "प्रजासत्ताक दिन" }),
    );

    let listed = request_ok(&mut stdin, &mut reader, "4", "calendar.list", json!({}));
    let holidays = listed["holidays"].as_array().expect("holidays");
    assert_eq!(holidays.len(), 2);
    // Chronological order.
    assert_eq!(holidays[0]["date"], json!("2026-01-26"));
    assert_eq!(holidays[1]["date"], json!("2026-08-15"));
    let events = listed["events"].as_array().expect("events");
    assert_eq!(events[0]["title"], json!("ध्वजारोहण"));

    let holiday_id = holidays[1]["id"].as_i64().expect("holiday id");
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "calendar.removeHoliday",
        json!({ "id": holiday_id }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "6", "calendar.list", json!({}));
    assert_eq!(listed["holidays"].as_array().expect("holidays").len(), 1);
    // The event on that date stays.
    assert_eq!(listed["events"].as_array().expect("events").len(), 1);

    let _ = child.kill();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn one_meal_plan_per_weekday() {
    let workspace = temp_dir("shaala-nutrition");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login_principal(&mut stdin, &mut reader, &workspace);

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "nutrition.save",
        json!({ "day": "monday", "breakfast": "उपमा", "lunch": "वरण भात" }),
    );
    let monday_id = saved["mealPlan"]["id"].as_i64().expect("id");

    let dup = request(
        &mut stdin,
        &mut reader,
        "2",
        "nutrition.save",
        json!({ "day": "monday", "breakfast": "पोहे", "lunch": "खिचडी" }),
    );
    assert_eq!(dup["error"]["code"], json!("validation_failed"));
    assert_eq!(dup["error"]["details"][0]["field"], json!("day"));

    // Replacing Monday's plan by id is allowed.
    let replaced = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "nutrition.save",
        json!({ "id": monday_id, "day": "monday", "breakfast": "पोहे", "lunch": "खिचडी" }),
    );
    assert_eq!(replaced["mealPlan"]["breakfast"], json!("पोहे"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "nutrition.save",
        json!({ "day": "tuesday", "breakfast": "शिरा", "lunch": "आमटी भात" }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "5", "nutrition.list", json!({}));
    assert_eq!(listed["mealPlans"].as_array().expect("plans").len(), 2);

    // Sunday is not a school day and not a valid plan day.
    let bad_day = request(
        &mut stdin,
        &mut reader,
        "6",
        "nutrition.save",
        json!({ "day": "sunday", "breakfast": "उपमा", "lunch": "वरण भात" }),
    );
    assert_eq!(bad_day["error"]["code"], json!("bad_params"));

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "nutrition.delete",
        json!({ "id": monday_id }),
    );
    let listed = request_ok(&mut stdin, &mut reader, "8", "nutrition.list", json!({}));
    assert_eq!(listed["mealPlans"].as_array().expect("plans").len(), 1);

    let _ = child.kill();
    let _ = std::fs::remove_dir_all(workspace);
}
