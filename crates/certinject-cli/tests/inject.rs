use std::fs;

mod common;

use common::{certinject, fingerprint, system_root_store};

const CERT: &[u8] = b"pretend this is a DER certificate";

#[test]
fn inject_writes_marked_blob_entry() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let cert_path = root.join("cert.der");
    fs::write(&cert_path, CERT).expect("write cert");

    certinject(root).arg("init").assert().success();
    let assert = certinject(root)
        .args(["inject", cert_path.to_str().expect("utf8 path")])
        .assert()
        .success();

    let fp = fingerprint(CERT);
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(stdout.contains(&fp));

    let entry = system_root_store(root).join(&fp);
    let blob = fs::read(entry.join("Blob")).expect("blob value");
    assert_eq!(blob.len(), 12 + CERT.len());
    assert_eq!(&blob[0..4], &[0x20, 0, 0, 0]);
    assert_eq!(&blob[4..8], &[1, 0, 0, 0]);
    assert_eq!(&blob[8..12], &(CERT.len() as u32).to_le_bytes());
    assert_eq!(&blob[12..], CERT);

    let marker = fs::read(entry.join("Certinject")).expect("marker value");
    assert_eq!(marker, 1u32.to_le_bytes());
}

#[test]
fn reinjecting_keeps_a_single_entry() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let cert_path = root.join("cert.der");
    fs::write(&cert_path, CERT).expect("write cert");

    certinject(root).arg("init").assert().success();
    for _ in 0..2 {
        certinject(root)
            .args(["inject", cert_path.to_str().expect("utf8 path")])
            .assert()
            .success();
    }

    let entries: Vec<_> = fs::read_dir(system_root_store(root))
        .expect("read store")
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn inject_fails_when_store_container_is_missing() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let cert_path = root.join("cert.der");
    fs::write(&cert_path, CERT).expect("write cert");

    certinject(root)
        .args(["inject", cert_path.to_str().expect("utf8 path")])
        .assert()
        .failure();
}

#[test]
fn inject_rejects_unknown_physical_store() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let cert_path = root.join("cert.der");
    fs::write(&cert_path, CERT).expect("write cert");

    let assert = certinject(root)
        .args([
            "--physical-store",
            "moon-base",
            "inject",
            cert_path.to_str().expect("utf8 path"),
        ])
        .assert()
        .failure();
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("moon-base"));
}

#[test]
fn inject_emits_json_envelope() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path();
    let cert_path = root.join("cert.der");
    fs::write(&cert_path, CERT).expect("write cert");

    certinject(root).arg("init").assert().success();
    let assert = certinject(root)
        .args(["--json", "inject", cert_path.to_str().expect("utf8 path")])
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    let payload: serde_json::Value = serde_json::from_str(stdout.trim()).expect("json");
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["fingerprint"], fingerprint(CERT));
}
