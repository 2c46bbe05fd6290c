use std::fs;

use lox_treewalk::run;
use walkdir::WalkDir;

const SCRIPT_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/scripts");

#[test]
fn scripts_produce_expected_output() {
    let mut count = 0;

    for entry in WalkDir::new(SCRIPT_DIR)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().map_or(false, |ext| ext == "lox"))
    {
        count += 1;
        let path = entry.path();
        let source = fs::read_to_string(path)
            .unwrap_or_else(|e| panic!("Failed to read {:?}: {}", path, e));
        let expected = fs::read_to_string(path.with_extension("out"))
            .unwrap_or_else(|e| panic!("Missing expected output for {:?}: {}", path, e));

        let mut out = Vec::new();
        if let Err(e) = run(&source, &mut out) {
            panic!("{:?} failed: {}", path, e);
        }
        assert_eq!(expected, String::from_utf8_lossy(&out), "output of {:?}", path);
    }

    assert!(count > 0, "No scripts found in {}", SCRIPT_DIR);
}
