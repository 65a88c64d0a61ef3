use std::fs;

use clap::Parser;
use flowscribe_cli::{load_settings, run, Args, CliError};
use flowscribe_core::{read_settings_from, OutputFormat};

#[tokio::test]
async fn config_save_writes_effective_settings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let path_arg = path.display().to_string();

    let args = Args::parse_from([
        "flowscribe",
        "config",
        "--save",
        "--settings",
        &path_arg,
        "--model",
        "llama3",
        "--format",
        "svg",
    ]);
    // Explicit settings file does not exist yet.
    assert!(matches!(load_settings(&args), Err(CliError::Settings(_))));

    fs::write(&path, "{}").unwrap();
    run(&args).await.unwrap();

    let saved = read_settings_from(&path).unwrap();
    assert_eq!(saved.generator.model, "llama3");
    assert_eq!(saved.renderer.format, OutputFormat::Svg);
    assert_eq!(saved.renderer.program, "mmdc");
}

#[tokio::test]
async fn generate_rejects_empty_text() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, "{}").unwrap();
    let path_arg = path.display().to_string();

    let args = Args::parse_from([
        "flowscribe",
        "generate",
        "--text",
        "   ",
        "--settings",
        &path_arg,
    ]);

    assert!(matches!(run(&args).await, Err(CliError::Input(_))));
}

#[tokio::test]
async fn check_reports_missing_renderer() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    fs::write(&path, r#"{"renderer": {"program": "flowscribe-no-such-renderer"}}"#).unwrap();
    let path_arg = path.display().to_string();

    let args = Args::parse_from(["flowscribe", "check", "--settings", &path_arg]);

    assert!(matches!(run(&args).await, Err(CliError::Render(_))));
}

#[cfg(unix)]
mod fake_renderer {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    fn settings_with(dir: &Path, script: &str) -> String {
        let program = dir.join("mmdc");
        fs::write(&program, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();

        let settings = dir.join("settings.json");
        let json = serde_json::json!({
            "renderer": {
                "program": program.display().to_string(),
                "outputDir": dir.join("static").display().to_string(),
            }
        });
        fs::write(&settings, json.to_string()).unwrap();
        settings.display().to_string()
    }

    #[tokio::test]
    async fn render_writes_artifact_named_after_input() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), "cp \"$2\" \"$4\"");
        let input = dir.path().join("order-flow.mmd");
        fs::write(&input, "A[Start] --> B{Done?}\n").unwrap();
        let input_arg = input.display().to_string();

        let args = Args::parse_from(["flowscribe", "render", &input_arg, "--settings", &settings]);
        run(&args).await.unwrap();

        let rendered: Vec<_> = fs::read_dir(dir.path().join("static"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(rendered.len(), 1);
        assert!(rendered[0].starts_with("order-flow"));
        assert!(rendered[0].ends_with(".png"));

        let written = fs::read_to_string(dir.path().join("static").join(&rendered[0])).unwrap();
        assert_eq!(written, "graph TD;\nA[Start] --> B[Done?]\n");
    }

    #[tokio::test]
    async fn render_also_exports_second_format_beside_the_first() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), "cp \"$2\" \"$4\"");
        let input = dir.path().join("order-flow.mmd");
        fs::write(&input, "A --> B\n").unwrap();
        let input_arg = input.display().to_string();

        let args = Args::parse_from([
            "flowscribe",
            "render",
            &input_arg,
            "--also",
            "svg",
            "--settings",
            &settings,
        ]);
        run(&args).await.unwrap();

        let mut rendered: Vec<_> = fs::read_dir(dir.path().join("static"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        rendered.sort();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].file_stem(), rendered[1].file_stem());
        assert!(rendered[0].extension().is_some_and(|ext| ext == "png"));
        assert!(rendered[1].extension().is_some_and(|ext| ext == "svg"));
    }

    #[tokio::test]
    async fn render_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with(dir.path(), "echo 'Parse error on line 1' >&2\nexit 1");
        let input = dir.path().join("broken.mmd");
        fs::write(&input, "A --> B\n").unwrap();
        let input_arg = input.display().to_string();

        let args = Args::parse_from(["flowscribe", "render", &input_arg, "--settings", &settings]);

        match run(&args).await {
            Err(CliError::Unrendered(diagnostic)) => {
                assert_eq!(diagnostic, "Parse error on line 1")
            }
            other => panic!("expected render failure, got {other:?}"),
        }
    }
}
