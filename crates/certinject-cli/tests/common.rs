#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use sha1::{Digest, Sha1};

/// Directory the default scope/logical-store selection resolves to under a
/// store root.
pub fn system_root_store(root: &Path) -> PathBuf {
    root.join("HKEY_LOCAL_MACHINE")
        .join("SOFTWARE")
        .join("Microsoft")
        .join("SystemCertificates")
        .join("Root")
        .join("Certificates")
}

pub fn certinject(root: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("certinject");
    cmd.env("CERTINJECT_STORE_ROOT", root);
    cmd
}

pub fn fingerprint(der: &[u8]) -> String {
    hex::encode_upper(Sha1::digest(der))
}
