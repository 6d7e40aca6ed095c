#[cfg(test)]
mod cli_integration_tests {
    use std::fs::{self, File};
    use std::path::Path;
    use assert_cmd::Command;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use predicates::prelude::*;
    use tempfile::tempdir;

    fn toolpkg(dir: &Path) -> Command {
        let mut cmd = Command::cargo_bin("toolpkg").unwrap();
        cmd.current_dir(dir).args(["--no-color", "--no-user-config"]);
        cmd
    }

    fn write_config(dir: &Path, source: &Path) {
        let archive = source.join("alpha.tar.gz");
        let encoder = GzEncoder::new(File::create(&archive).unwrap(), Compression::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(3);
        header.set_mode(0o644);
        builder.append_data(&mut header, "alpha/out", &b"bin"[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let config = format!(
            r#"
[paths]
patches = "patches"

[[package]]
name = "alpha"
description = "Alpha test tool"
subdir = "alpha"
url = 'file://{}'
fmt = "tar-gz"
build = ["echo build"]
install = ["cp out %s"]

[[package]]
name = "beta"
description = "Beta test tool"
subdir = "beta"
url = "https://example.invalid/beta.tgz"
fmt = "tgz"
build = ["make"]
install = ["cp beta %s"]
"#,
            archive.display()
        );
        fs::write(dir.join("toolpkg.toml"), config).unwrap();
    }

    #[test]
    fn test_commands_lists_verbs() {
        let dir = tempdir().unwrap();
        toolpkg(dir.path())
            .arg("commands")
            .assert()
            .success()
            .stdout(predicate::str::contains("Available commands:"))
            .stdout(predicate::str::contains("install package"))
            .stdout(predicate::str::contains("rebuild package"))
            .stdout(predicate::str::contains("Shows list of commands"));
    }

    #[test]
    fn test_list_shows_builtin_and_configured_packages() {
        let dir = tempdir().unwrap();
        let source = tempdir().unwrap();
        write_config(dir.path(), source.path());
        toolpkg(dir.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("Available packages:"))
            .stdout(predicate::str::contains("minisat"))
            .stdout(predicate::str::contains("Alpha test tool"));
        assert!(!dir.path().join("build").exists());
    }

    #[test]
    fn test_list_json() {
        let dir = tempdir().unwrap();
        let output = toolpkg(dir.path())
            .args(["--json", "list"])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert!(value.as_array().unwrap().iter().any(|p| p["name"] == "sat13"));
    }

    #[test]
    fn test_no_arguments_prints_usage() {
        let dir = tempdir().unwrap();
        toolpkg(dir.path())
            .assert()
            .code(2)
            .stderr(predicate::str::contains("usage:"))
            .stderr(predicate::str::contains("commands' to get a list of all commands"));
    }

    #[test]
    fn test_unknown_verb() {
        let dir = tempdir().unwrap();
        toolpkg(dir.path())
            .arg("foo")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("unknown command 'foo'"));
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_missing_and_unknown_package() {
        let dir = tempdir().unwrap();
        toolpkg(dir.path())
            .arg("install")
            .assert()
            .code(2)
            .stderr(predicate::str::contains("requires a package name"));
        toolpkg(dir.path())
            .args(["install", "nope"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unknown package 'nope'"));
    }

    #[test]
    fn test_install_alpha() {
        let dir = tempdir().unwrap();
        let source = tempdir().unwrap();
        write_config(dir.path(), source.path());
        toolpkg(dir.path())
            .args(["install", "alpha"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Installed"));
        assert!(dir.path().join("build").join("tools").join("alpha").is_dir());
        assert_eq!(fs::read_to_string(dir.path().join("ext").join("bin").join("out")).unwrap(), "bin");
    }

    #[test]
    fn test_install_with_root_option() {
        let dir = tempdir().unwrap();
        let elsewhere = tempdir().unwrap();
        let source = tempdir().unwrap();
        write_config(dir.path(), source.path());
        toolpkg(elsewhere.path())
            .arg("--root")
            .arg(dir.path())
            .args(["install", "alpha"])
            .assert()
            .success();
        assert!(dir.path().join("ext").join("bin").join("out").is_file());
    }

    #[test]
    fn test_rebuild_unfetched_package_fails() {
        let dir = tempdir().unwrap();
        let source = tempdir().unwrap();
        write_config(dir.path(), source.path());
        toolpkg(dir.path())
            .args(["rebuild", "beta"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("rebuild beta failed while preparing"))
            .stderr(predicate::str::contains("does not exist"));
    }

    #[test]
    fn test_update_archive_package_unsupported() {
        let dir = tempdir().unwrap();
        let source = tempdir().unwrap();
        write_config(dir.path(), source.path());
        toolpkg(dir.path())
            .args(["update", "alpha"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("update alpha failed while preparing"))
            .stderr(predicate::str::contains("not supported"));
        assert!(!dir.path().join("ext").join("bin").join("out").exists());
    }

    #[test]
    fn test_explicit_config_file() {
        let dir = tempdir().unwrap();
        let source = tempdir().unwrap();
        write_config(source.path(), source.path());
        toolpkg(dir.path())
            .arg("--config")
            .arg(source.path().join("toolpkg.toml"))
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("Alpha test tool"));
        toolpkg(dir.path())
            .arg("list")
            .assert()
            .success()
            .stdout(predicate::str::contains("Alpha test tool").not());
    }

    #[test]
    fn test_invalid_config_fails() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("toolpkg.toml"),
            "[[package]]\nname = \"x\"\ndescription = \"x\"\nsubdir = \"../x\"\nurl = \"x.tgz\"\nfmt = \"tgz\"\n",
        )
        .unwrap();
        toolpkg(dir.path())
            .arg("list")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("invalid package definitions"));
    }
}
