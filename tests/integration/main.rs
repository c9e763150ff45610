//! Integration tests for Shelter

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn shelter() -> Command {
        let mut cmd = cargo_bin_cmd!("shelter");
        cmd.env_remove("SHELTER_CONFIG").env("CI", "1");
        cmd
    }

    /// A project directory with a built site and a local shelter.toml
    struct Project {
        dir: TempDir,
    }

    impl Project {
        fn new(version: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let site = dir.path().join("site");
            fs::create_dir_all(&site).unwrap();
            fs::write(site.join("index.html"), "<h1>Home</h1>").unwrap();
            fs::write(site.join("offline.html"), "<h1>You are offline</h1>").unwrap();
            fs::write(site.join("app.css"), "body{}").unwrap();

            let project = Self { dir };
            project.write_config(version);
            project
        }

        fn write_config(&self, version: &str) {
            let config = format!(
                r#"[worker]
version = "{version}"
base_path = "/"
offline_page = "offline.html"
assets = ["", "index.html", "offline.html", "app.css"]

[network]
root = "{root}"

[storage]
dir = "{state}"
"#,
                version = version,
                root = toml_path(&self.dir.path().join("site")),
                state = toml_path(&self.dir.path().join("state")),
            );
            fs::write(self.dir.path().join("shelter.toml"), config).unwrap();
        }

        fn cmd(&self) -> Command {
            let mut cmd = shelter();
            cmd.current_dir(self.dir.path());
            cmd
        }

        fn install(&self) {
            self.cmd().arg("install").assert().success();
        }
    }

    fn toml_path(path: &Path) -> String {
        path.display().to_string().replace('\\', "/")
    }

    #[test]
    fn help_displays() {
        shelter()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline-first cache controller"));
    }

    #[test]
    fn version_displays() {
        shelter()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("shelter"));
    }

    #[test]
    fn config_path_explicit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("custom.toml");
        shelter()
            .args(["config", "path", "--config"])
            .arg(&path)
            .assert()
            .success()
            .stdout(predicate::str::contains("custom.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let dir = TempDir::new().unwrap();
        shelter()
            .args(["config", "show", "--config"])
            .arg(dir.path().join("missing.toml"))
            .assert()
            .success()
            .stdout(predicate::str::contains("[worker]"))
            .stdout(predicate::str::contains("pwa-cache-v1"));
    }

    #[test]
    fn config_invalid_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[worker\nversion = ").unwrap();
        shelter()
            .args(["config", "show", "--config"])
            .arg(&path)
            .assert()
            .failure()
            .stderr(predicate::str::contains("bad.toml"));
    }

    #[test]
    fn install_then_status_ready() {
        let project = Project::new("site-v1");
        project
            .cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("4 assets"));

        project
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("activated"))
            .stdout(predicate::str::contains("Ready to serve offline"));
    }

    #[test]
    fn offline_navigation_serves_offline_page() {
        let project = Project::new("site-v1");
        project.install();

        project
            .cmd()
            .args(["fetch", "/some/deep/link", "--navigate", "--offline"])
            .assert()
            .success()
            .stdout("<h1>You are offline</h1>")
            .stderr(predicate::str::contains("offline-fallback"));
    }

    #[test]
    fn online_navigation_uses_network() {
        let project = Project::new("site-v1");
        project.install();

        fs::write(project.dir.path().join("site/index.html"), "<h1>New</h1>").unwrap();
        project
            .cmd()
            .args(["fetch", "/index.html", "--accept", "text/html"])
            .assert()
            .success()
            .stdout("<h1>New</h1>")
            .stderr(predicate::str::contains("network"));
    }

    #[test]
    fn offline_resource_served_from_cache() {
        let project = Project::new("site-v1");
        project.install();

        project
            .cmd()
            .args(["fetch", "/app.css", "--offline"])
            .assert()
            .success()
            .stdout("body{}")
            .stderr(predicate::str::contains("cache"));
    }

    #[test]
    fn offline_uncached_resource_fails() {
        let project = Project::new("site-v1");
        project.install();

        project
            .cmd()
            .args(["fetch", "/api/data.json", "--offline"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error:"));
    }

    #[test]
    fn fetch_before_install_passes_through() {
        let project = Project::new("site-v1");
        project
            .cmd()
            .args(["fetch", "/index.html", "--navigate"])
            .assert()
            .success()
            .stdout("<h1>Home</h1>");

        project
            .cmd()
            .args(["fetch", "/index.html", "--navigate", "--offline"])
            .assert()
            .failure();
    }

    #[test]
    fn failed_install_leaves_no_bucket() {
        let project = Project::new("site-v1");
        fs::remove_file(project.dir.path().join("site/app.css")).unwrap();

        project
            .cmd()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("404"));

        project
            .cmd()
            .args(["cache", "list"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cache buckets found"));
    }

    #[test]
    fn new_version_deletes_old_bucket() {
        let project = Project::new("site-v1");
        project.install();
        project.write_config("site-v2");

        project
            .cmd()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("site-v1"));

        project
            .cmd()
            .args(["cache", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout("site-v2\n");
    }

    #[test]
    fn cache_show_lists_entries() {
        let project = Project::new("site-v1");
        project.install();

        project
            .cmd()
            .args(["cache", "show", "site-v1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("/offline.html"))
            .stdout(predicate::str::contains("/app.css"));

        project
            .cmd()
            .args(["cache", "show", "nope"])
            .assert()
            .failure();
    }

    #[test]
    fn cache_clear_resets_worker() {
        let project = Project::new("site-v1");
        project.install();

        project
            .cmd()
            .args(["cache", "clear", "--yes"])
            .assert()
            .success();

        project
            .cmd()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("installing"))
            .stdout(predicate::str::contains("missing"));
    }

    #[test]
    fn push_without_payload_uses_placeholder() {
        let project = Project::new("site-v1");
        project
            .cmd()
            .arg("push")
            .assert()
            .success()
            .stdout(predicate::str::contains("My PWA"))
            .stdout(predicate::str::contains("Notification without data"));

        project
            .cmd()
            .args(["push", "Build finished"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Build finished"));
    }

    #[test]
    fn sync_ignores_other_tags() {
        let project = Project::new("site-v1");
        project
            .cmd()
            .args(["sync", "other-tag"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Ignored sync tag"));

        project
            .cmd()
            .args(["sync", "sync-data"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Sync completed"));
    }

    #[test]
    fn journal_records_install() {
        let project = Project::new("site-v1");
        project.install();

        project
            .cmd()
            .arg("journal")
            .assert()
            .success()
            .stdout(predicate::str::contains("worker.installed"))
            .stdout(predicate::str::contains("worker.activated"));
    }

    #[test]
    fn activate_requires_install() {
        let project = Project::new("site-v1");
        project
            .cmd()
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("installed"));
    }
}
