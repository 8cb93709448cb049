use std::fs;
use std::path::PathBuf;

use fixture_shatter::corruption::{shatter, FilterEntry, ShatterFilter, ShatterOptions, Variant};
use serde_json::{Map, Value};

fn fixtures_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/golden/fixtures")
}

fn expected_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/golden/expected")
        .join(name)
}

fn read_expected(name: &str) -> String {
    fs::read_to_string(expected_path(name))
        .expect("expected file missing")
        .trim_end()
        .to_string()
}

fn read_fixture(name: &str) -> Map<String, Value> {
    let file = fs::File::open(fixtures_root().join(name)).expect("fixture missing");
    serde_json::from_reader(file).expect("fixture is not a JSON object")
}

fn shatter_to_json(document: &Map<String, Value>, options: &ShatterOptions) -> String {
    let variants: Vec<Variant> = shatter(document, options).collect();
    serde_json::to_string(&variants).unwrap()
}

#[test]
fn golden_audio_transcript_removals() {
    let document = read_fixture("audio.json");
    let options = ShatterOptions::default()
        .depth(-1)
        .affected(ShatterFilter::keys(["vtt", "gentleVtt"]));

    let json = shatter_to_json(&document, &options);
    let expected = read_expected("audio_transcripts.json");
    assert_eq!(json, expected, "audio variants do not match golden");
}

#[test]
fn golden_profile_unlimited_depth() {
    let document = read_fixture("profile.json");
    let options = ShatterOptions::default()
        .depth(-1)
        .unaffected(ShatterFilter::Keys(vec![FilterEntry::nested(
            "settings",
            ShatterFilter::keys(["theme"]),
        )]));

    let json = shatter_to_json(&document, &options);
    let expected = read_expected("profile_unlimited.json");
    assert_eq!(json, expected, "profile variants do not match golden");
}
