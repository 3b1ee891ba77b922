//! Integration tests for tribecal-cli.
//!
//! Tests drive the built binary against WAV files generated into temporary
//! directories. The calibration round trip uses a shell script as the
//! emulator, so it only runs on Unix.

use std::f32::consts::PI;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;
use tribecal_analysis::AudioBuffer;

/// Helper to get the path to the `tribecal` binary built by cargo.
fn tribecal_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tribecal"))
}

fn tone(freq: f32, sample_rate: u32, len: usize) -> AudioBuffer {
    let samples = (0..len)
        .map(|i| {
            let phase = 2.0 * PI * freq * i as f32 / sample_rate as f32;
            0.5 * phase.sin() + 0.2 * (2.0 * phase).sin()
        })
        .collect();
    AudioBuffer::new(samples, sample_rate).unwrap()
}

fn write_tone(path: &Path, freq: f32) {
    tribecal_io::write_wav(path, &tone(freq, 48000, 48000)).unwrap();
}

fn stdout_of(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

// ---------------------------------------------------------------------------
// Basic invocation
// ---------------------------------------------------------------------------

#[test]
fn cli_help_lists_subcommands() {
    let output = tribecal_bin().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = stdout_of(&output);
    for command in ["compare", "analyze", "calibrate", "regress", "config"] {
        assert!(stdout.contains(command), "help should mention '{command}'");
    }
}

#[test]
fn cli_version() {
    let output = tribecal_bin().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(stdout_of(&output).contains("tribecal"));
}

// ---------------------------------------------------------------------------
// compare
// ---------------------------------------------------------------------------

#[test]
fn cli_compare_identical_files_match() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference.wav");
    let candidate = dir.path().join("candidate.wav");
    let report = dir.path().join("report.json");
    write_tone(&reference, 440.0);
    write_tone(&candidate, 440.0);

    let output = tribecal_bin()
        .arg("compare")
        .arg(&reference)
        .arg(&candidate)
        .args(["--window-size", "4096", "-o"])
        .arg(&report)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("match achieved"), "{stdout}");
    assert!(stdout.contains("Harmonics"));

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(json["verdict"], "match achieved");
    assert!(json["metrics"]["spectral_correlation"].as_f64().unwrap() > 0.999);
    assert_eq!(json["spectrum"]["reference"]["harmonics"].as_array().unwrap().len(), 5);
}

#[test]
fn cli_compare_different_pitch_diverges() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference.wav");
    let candidate = dir.path().join("candidate.wav");
    write_tone(&reference, 440.0);
    write_tone(&candidate, 1250.0);

    let output = tribecal_bin()
        .arg("compare")
        .arg(&reference)
        .arg(&candidate)
        .args(["--window-size", "4096"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("divergent"));
}

#[test]
fn cli_compare_timing_with_gate() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference.wav");
    let gate = dir.path().join("gate.wav");
    let report = dir.path().join("report.json");
    write_tone(&reference, 440.0);

    let gate_samples: Vec<f32> = (0..48000)
        .map(|i| if (4800..24000).contains(&i) { 1.0 } else { 0.0 })
        .collect();
    tribecal_io::write_wav(&gate, &AudioBuffer::new(gate_samples, 48000).unwrap()).unwrap();

    let output = tribecal_bin()
        .arg("compare")
        .arg(&reference)
        .arg(&reference)
        .args(["--analysis", "timing", "--gate"])
        .arg(&gate)
        .arg("-o")
        .arg(&report)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    let events = json["timing"]["reference"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["gate_on"], 4799);
    assert!(json.get("spectrum").is_none());
}

#[test]
fn cli_compare_timing_requires_gate() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference.wav");
    write_tone(&reference, 440.0);

    let output = tribecal_bin()
        .arg("compare")
        .arg(&reference)
        .arg(&reference)
        .args(["--analysis", "timing"])
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("--gate"));
}

#[test]
fn cli_compare_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference.wav");
    write_tone(&reference, 440.0);

    let output = tribecal_bin()
        .arg("compare")
        .arg(&reference)
        .arg(dir.path().join("nonexistent.wav"))
        .output()
        .unwrap();

    assert!(!output.status.success());
}

#[test]
fn cli_compare_warns_on_rate_mismatch() {
    let dir = TempDir::new().unwrap();
    let reference = dir.path().join("reference.wav");
    let candidate = dir.path().join("candidate.wav");
    tribecal_io::write_wav(&reference, &tone(440.0, 48000, 8192)).unwrap();
    tribecal_io::write_wav(&candidate, &tone(440.0, 44100, 8192)).unwrap();

    let output = tribecal_bin()
        .arg("compare")
        .arg(&reference)
        .arg(&candidate)
        .args(["--window-size", "2048"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("sample rates differ"));
}

// ---------------------------------------------------------------------------
// analyze
// ---------------------------------------------------------------------------

#[test]
fn cli_analyze_spectrum_reports_fundamental() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tone.wav");
    let out = dir.path().join("spectrum.json");
    write_tone(&input, 1500.0);

    let output = tribecal_bin()
        .args(["analyze", "spectrum"])
        .arg(&input)
        .args(["--window-size", "4096", "-o"])
        .arg(&out)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let fundamental = json["harmonics"]["fundamental_hz"].as_f64().unwrap();
    assert!((fundamental - 1500.0).abs() < 12.0, "fundamental {fundamental}");
    assert_eq!(json["spectrum"]["frequencies"].as_array().unwrap().len(), 2048);
}

#[test]
fn cli_analyze_spectrum_window_from_config_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tone.wav");
    let config = dir.path().join("tribecal.toml");
    let out = dir.path().join("spectrum.json");
    write_tone(&input, 1500.0);
    std::fs::write(&config, "window_size = 1024\n").unwrap();

    let output = tribecal_bin()
        .args(["analyze", "spectrum"])
        .arg(&input)
        .arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(&out)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = stdout_of(&output);
    assert!(stdout.contains("Float32, 1 channel(s), 48000 frames"), "{stdout}");

    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(json["spectrum"]["window_size"], 1024);
    assert_eq!(json["spectrum"]["frequencies"].as_array().unwrap().len(), 512);
    assert_eq!(json["channels"], 1);
    assert_eq!(json["format"], "Float32");
}

#[test]
fn cli_analyze_transfer_handles_unequal_lengths() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("dry.wav");
    let wet = dir.path().join("wet.wav");
    tribecal_io::write_wav(&input, &tone(440.0, 48000, 4800)).unwrap();
    tribecal_io::write_wav(&wet, &tone(440.0, 48000, 4000)).unwrap();

    let output = tribecal_bin()
        .args(["analyze", "transfer"])
        .arg(&input)
        .arg(&wet)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(stdout_of(&output).contains("4000 samples"));
}

#[test]
fn cli_analyze_envelope_requires_gate() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("tone.wav");
    write_tone(&input, 440.0);

    let output = tribecal_bin()
        .args(["analyze", "envelope"])
        .arg(&input)
        .output()
        .unwrap();

    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

#[test]
fn cli_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("conf").join("tribecal.toml");

    let init = tribecal_bin()
        .args(["config", "init", "--path"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(init.status.success());
    assert!(path.is_file());

    let again = tribecal_bin()
        .args(["config", "init", "--path"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!again.status.success(), "init should not overwrite without --force");

    let show = tribecal_bin()
        .args(["config", "show", "--path"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(show.status.success());
    let stdout = stdout_of(&show);
    assert!(stdout.contains("window_size = 4096"), "{stdout}");
    assert!(stdout.contains("[thresholds]"));
}

#[test]
fn cli_config_show_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "window_size = 0\n").unwrap();

    let output = tribecal_bin()
        .args(["config", "show", "--path"])
        .arg(&path)
        .output()
        .unwrap();
    assert!(!output.status.success());
}

// ---------------------------------------------------------------------------
// calibrate / regress
// ---------------------------------------------------------------------------

#[test]
fn cli_calibrate_empty_directory() {
    let dir = TempDir::new().unwrap();
    let output = tribecal_bin()
        .arg("calibrate")
        .arg(dir.path())
        .args(["--render-cmd", "true"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(stdout_of(&output).contains("No .wav recordings found"));
}

#[test]
fn cli_calibrate_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let output = tribecal_bin()
        .arg("calibrate")
        .arg(dir.path().join("absent"))
        .args(["--render-cmd", "true"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}

/// Shell "emulator" that ignores its parameters and copies `source` to the output path.
#[cfg(unix)]
fn copy_emulator(dir: &Path, name: &str, source: &Path) -> String {
    let script = dir.join(name);
    std::fs::write(&script, format!("cp \"{}\" \"$1\"\n", source.display())).unwrap();
    format!("sh {}", script.display())
}

#[cfg(unix)]
#[test]
fn cli_calibrate_then_regress() {
    let dir = TempDir::new().unwrap();
    let recordings = dir.path().join("recordings");
    let results = dir.path().join("results");
    let corpus = dir.path().join("corpus");
    std::fs::create_dir_all(&recordings).unwrap();

    let recording = recordings.join("monotribe_cutoff_50_resonance_20.wav");
    write_tone(&recording, 440.0);
    let other = dir.path().join("other.wav");
    write_tone(&other, 1250.0);

    let config = dir.path().join("tribecal.toml");
    std::fs::write(
        &config,
        "initial_parameters = [1.0, 0.5]\n\n[optimizer]\nmax_evaluations = 12\n\n[output]\ncorpus_sample_rate = 48000\n",
    )
    .unwrap();

    let faithful = copy_emulator(dir.path(), "faithful.sh", &recording);
    let output = tribecal_bin()
        .arg("calibrate")
        .arg(&recordings)
        .args(["--render-cmd", &faithful, "--config"])
        .arg(&config)
        .arg("--results-dir")
        .arg(&results)
        .arg("--reference-dir")
        .arg(&corpus)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(results.join("calibration_results.json")).unwrap(),
    )
    .unwrap();
    let record = &report["monotribe_cutoff_50_resonance_20"];
    assert_eq!(record["test_conditions"]["cutoff"], 50.0);
    assert_eq!(record["test_conditions"]["resonance"], 20.0);
    assert_eq!(record["optimal_parameters"].as_array().unwrap().len(), 2);
    assert!(record["target_similarity"].as_f64().unwrap() > 0.999);

    assert!(corpus.join("params_monotribe_cutoff_50_resonance_20.json").is_file());
    assert!(corpus.join("audio_monotribe_cutoff_50_resonance_20.wav").is_file());

    let pass = tribecal_bin()
        .arg("regress")
        .arg(&corpus)
        .args(["--render-cmd", &faithful])
        .output()
        .unwrap();
    assert!(pass.status.success(), "{}", stdout_of(&pass));
    assert!(stdout_of(&pass).contains("[PASS]"));

    let drifted = copy_emulator(dir.path(), "drifted.sh", &other);
    let fail = tribecal_bin()
        .arg("regress")
        .arg(&corpus)
        .args(["--render-cmd", &drifted, "--threshold", "0.99"])
        .output()
        .unwrap();
    assert!(!fail.status.success());
    assert!(stdout_of(&fail).contains("[FAIL]"));
}

#[cfg(unix)]
#[test]
fn cli_calibrate_no_corpus() {
    let dir = TempDir::new().unwrap();
    let recordings = dir.path().join("recordings");
    let results = dir.path().join("results");
    let corpus = dir.path().join("corpus");
    std::fs::create_dir_all(&recordings).unwrap();
    let recording = recordings.join("take.wav");
    write_tone(&recording, 440.0);

    let config = dir.path().join("tribecal.toml");
    std::fs::write(&config, "initial_parameters = [1.0]\n\n[optimizer]\nmax_evaluations = 6\n")
        .unwrap();

    let emulator = copy_emulator(dir.path(), "emulator.sh", &recording);
    let output = tribecal_bin()
        .arg("calibrate")
        .arg(&recordings)
        .args(["--render-cmd", &emulator, "--no-corpus", "--config"])
        .arg(&config)
        .arg("--results-dir")
        .arg(&results)
        .arg("--reference-dir")
        .arg(&corpus)
        .output()
        .unwrap();

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    assert!(results.join("calibration_results.json").is_file());
    assert!(!corpus.exists());
}
