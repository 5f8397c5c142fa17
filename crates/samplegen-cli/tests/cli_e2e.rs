use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn samplegen_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_samplegen"))
}

fn run(args: &[&str]) -> Output {
    Command::new(samplegen_bin())
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("run samplegen")
}

fn write_config(dir: &Path, config: serde_json::Value) -> PathBuf {
    let path = dir.join("samplegen.json");
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).expect("write config");
    path
}

fn read_array(path: &Path) -> Vec<serde_json::Value> {
    let text = fs::read_to_string(path).expect("read output");
    serde_json::from_str::<serde_json::Value>(&text)
        .expect("output is JSON")
        .as_array()
        .expect("output is an array")
        .clone()
}

#[test]
fn generate_users_is_deterministic_for_a_fixed_seed_and_clock() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        serde_json::json!({
            "output": "out/first.json",
            "users": 2,
            "seed": 7,
            "now": "2024-01-15T12:00:00Z",
            "organization": "org-e2e"
        }),
    );

    let first = run(&["generate", config.to_str().unwrap()]);
    assert!(first.status.success(), "stderr: {}", String::from_utf8_lossy(&first.stderr));
    let second_path = dir.path().join("second.json");
    let second = run(&[
        "generate",
        config.to_str().unwrap(),
        "--output",
        second_path.to_str().unwrap(),
    ]);
    assert!(second.status.success(), "stderr: {}", String::from_utf8_lossy(&second.stderr));

    let first = read_array(&dir.path().join("out/first.json"));
    let second = read_array(&second_path);
    assert!(!first.is_empty());
    assert_eq!(first, second);

    for resource in &first {
        assert!(resource["_t"].is_string());
        assert!(resource["_link"].is_string());
        assert!(resource["_s"].is_string());
    }
    assert!(first
        .iter()
        .any(|r| r["_t"] == "tradle.ProductRequest"));
}

#[test]
fn generate_by_type_writes_exact_counts_plus_side_effects() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("types.json");
    let config = write_config(
        dir.path(),
        serde_json::json!({
            "output": output,
            "types": { "tradle.Selfie": 2, "tradle.PersonalInfo": 1 },
            "seed": 3
        }),
    );

    let out = run(&["generate", config.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let resources = read_array(&output);
    let count = |ty: &str| resources.iter().filter(|r| r["_t"] == ty).count();
    assert_eq!(count("tradle.Selfie"), 2);
    assert!(count("tradle.PersonalInfo") >= 1);
}

#[test]
fn failed_run_writes_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("never.json");
    let config = write_config(
        dir.path(),
        serde_json::json!({
            "output": output,
            "types": { "demo.DoesNotExist": 1 },
            "seed": 1
        }),
    );

    let out = run(&["generate", config.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(!output.exists());
}

#[test]
fn types_and_users_together_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        serde_json::json!({
            "output": "out.json",
            "types": { "tradle.Selfie": 1 },
            "users": 1
        }),
    );

    let out = run(&["generate", config.to_str().unwrap()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("types"), "stderr: {stderr}");
}

#[test]
fn users_flag_overrides_types() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        serde_json::json!({
            "output": "out.json",
            "types": { "tradle.Selfie": 1 },
            "seed": 11
        }),
    );

    let out = run(&["generate", config.to_str().unwrap(), "--users", "1"]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let resources = read_array(&dir.path().join("out.json"));
    assert!(resources.iter().any(|r| r["_t"] == "tradle.ApplicationSubmitted"));
}

#[test]
fn products_lists_eligible_products() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), serde_json::json!({ "seed": 5 }));

    let out = run(&["products", config.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("tradle.CurrentAccount"), "stdout: {stdout}");
    assert!(!stdout.contains("tradle.Remediation"));
}

#[test]
fn check_models_accepts_the_bundled_registry() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), serde_json::json!({}));

    let out = run(&["check-models", config.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).contains("ok"));
}

#[test]
fn check_models_reports_unknown_directives_until_an_extension_supplies_them() {
    let dir = tempfile::tempdir().unwrap();
    let models = serde_json::json!({
        "demo.Pet": {
            "subClassOf": "tradle.Form",
            "properties": {
                "species": { "type": "string", "sample": "pet.species" }
            }
        }
    });

    let config = write_config(dir.path(), serde_json::json!({ "models": models }));
    let out = run(&["check-models", config.to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("pet.species"));

    fs::write(
        dir.path().join("fakers.json"),
        r#"{ "pet.species": ["cat", "dog", "axolotl"] }"#,
    )
    .unwrap();
    let config = write_config(
        dir.path(),
        serde_json::json!({ "models": models, "extension": "fakers.json" }),
    );
    let out = run(&["check-models", config.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
}
