//! Corpus tree builders

use super::audio_generator::{generate_test_wav, AudioConfig};
use std::path::{Path, PathBuf};

/// Tone WAV at `root/rel` with a `.lab` sidecar holding `transcript`
pub fn add_recording(root: &Path, rel: &str, transcript: &[u8]) -> PathBuf {
    let path = generate_test_wav(&root.join(rel), &AudioConfig::default()).unwrap();
    std::fs::write(path.with_extension("lab"), transcript).unwrap();
    path
}

/// Canonical file name for `speaker`, take `n`
pub fn canonical_file(speaker: &str, command: &str, n: usize) -> String {
    format!(
        "zhongguo_putonghua_normal_1m_woman_youth_{}_{}_01+MD5+{:032x}.wav",
        speaker, command, n
    )
}

/// `corpus_root/label/<source>/domestic/` holding `count` files per speaker
pub fn build_label_dir(corpus_root: &Path, label: &str, speakers: &[(&str, usize)]) -> PathBuf {
    let dir = corpus_root.join(label).join("来源A").join("domestic");
    let mut n = 0;
    for (speaker, count) in speakers {
        for _ in 0..*count {
            n += 1;
            generate_test_wav(
                &dir.join(canonical_file(speaker, "dakai", n)),
                &AudioConfig::default(),
            )
            .unwrap();
        }
    }
    dir
}

/// Temp dir whose random name cannot trip the path keyword rules
///
/// Classification matches keywords such as `2m` or `man` against the whole
/// path, including the temp dir prefix.
pub fn corpus_temp_dir() -> tempfile::TempDir {
    loop {
        let dir = tempfile::Builder::new().prefix("corpus").tempdir().unwrap();
        let name = dir.path().file_name().unwrap().to_string_lossy().to_lowercase();
        if !name.chars().any(|c| c.is_ascii_digit()) && !name.contains("man") {
            return dir;
        }
    }
}
