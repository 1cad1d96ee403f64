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

/// Setup, roster one teacher for "5 वी", and log in as that teacher.
fn login_class_teacher(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    workspace: &PathBuf,
) {
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
    let _ = request_ok(
        stdin,
        reader,
        "setup-4",
        "teachers.save",
        json!({
            "name": "सुनीता पाटील",
            "mobile": "9123456780",
            "subject": "गणित",
            "class_assigned": "5 वी"
        }),
    );
    let _ = request_ok(stdin, reader, "setup-5", "auth.logout", json!({}));
    let _ = request_ok(
        stdin,
        reader,
        "setup-6",
        "auth.login",
        json!({ "mobile": "9123456780", "password": "9123456780", "role": "teacher" }),
    );
}

#[test]
fn attendance_is_a_full_overwrite_per_day() {
    let workspace = temp_dir("shaala-attendance");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login_class_teacher(&mut stdin, &mut reader, &workspace);

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.save",
        json!({ "date": "2026-08-24", "entries": { "101": true, "102": false, "103": true } }),
    );
    assert_eq!(saved["class"], json!("5 वी"));
    assert_eq!(saved["saved"], json!(3));

    // Re-save with fewer entries: the earlier sheet is replaced, not merged.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "attendance.save",
        json!({ "date": "2026-08-24", "entries": { "101": false } }),
    );
    let got = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.get",
        json!({ "date": "2026-08-24" }),
    );
    assert_eq!(got["entries"], json!({ "101": false }));

    // A different day is untouched.
    let other = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "attendance.get",
        json!({ "date": "2026-08-25" }),
    );
    assert_eq!(other["entries"], json!({}));

    let _ = child.kill();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn teacher_cannot_address_another_class() {
    let workspace = temp_dir("shaala-class-scope");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login_class_teacher(&mut stdin, &mut reader, &workspace);

    let denied = request(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.save",
        json!({ "class": "6 वी", "date": "2026-08-24", "entries": { "201": true } }),
    );
    assert_eq!(denied["error"]["code"], json!("unauthorized"));

    let denied = request(
        &mut stdin,
        &mut reader,
        "2",
        "marks.get",
        json!({ "class": "6 वी", "examType": "term1", "subject": "गणित" }),
    );
    assert_eq!(denied["error"]["code"], json!("unauthorized"));

    let _ = child.kill();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn marks_roundtrip_with_timestamp() {
    let workspace = temp_dir("shaala-marks");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login_class_teacher(&mut stdin, &mut reader, &workspace);

    let saved = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "marks.save",
        json!({
            "examType": "term1",
            "subject": "गणित",
            "maxMarks": 50.0,
            "marks": { "101": 42.5, "102": 38.0 }
        }),
    );
    assert_eq!(saved["saved"], json!(2));
    assert!(saved["updatedAt"].as_str().expect("timestamp").contains('T'));

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "marks.get",
        json!({ "examType": "term1", "subject": "गणित" }),
    );
    assert_eq!(got["record"]["maxMarks"], json!(50.0));
    assert_eq!(got["record"]["marks"]["101"], json!(42.5));

    // A sitting never written reads back as null, not an error.
    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "marks.get",
        json!({ "examType": "term2", "subject": "गणित" }),
    );
    assert_eq!(empty["record"], json!(null));

    let _ = child.kill();
    let _ = std::fs::remove_dir_all(workspace);
}

#[test]
fn state_survives_a_daemon_restart() {
    let workspace = temp_dir("shaala-restart");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    login_class_teacher(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "attendance.save",
        json!({ "date": "2026-08-24", "entries": { "101": true, "102": false } }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "homework.add",
        json!({ "subject": "गणित", "description": "पान ४२, उदाहरणे १-५", "date": "2026-08-24" }),
    );

    drop(stdin);
    let _ = child.wait();

    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    // The persisted session is adopted on reopen; no fresh login needed.
    let session = request_ok(&mut stdin, &mut reader, "2", "auth.session", json!({}));
    assert_eq!(session["user"]["mobile"], json!("9123456780"));
    assert_eq!(session["user"]["class_assigned"], json!("5 वी"));

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "attendance.get",
        json!({ "date": "2026-08-24" }),
    );
    assert_eq!(got["entries"], json!({ "101": true, "102": false }));

    let homework = request_ok(&mut stdin, &mut reader, "4", "homework.list", json!({}));
    assert_eq!(homework["homework"][0]["subject"], json!("गणित"));

    let _ = child.kill();
    let _ = std::fs::remove_dir_all(workspace);
}
