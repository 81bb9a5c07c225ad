// tests/glob_patterns.rs

use treewatch::watch::GlobPredicate;

fn pats(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[test]
fn empty_include_matches_everything_and_empty_exclude_nothing() {
    let include = GlobPredicate::include(&[]).unwrap();
    let exclude = GlobPredicate::exclude(&[]).unwrap();

    for path in ["a.txt", "src/main.rs", "tmp"] {
        assert!(include.is_match(path), "{path} not included");
        assert!(!exclude.is_match(path), "{path} excluded");
    }
}

#[test]
fn trailing_double_star_exclude_covers_the_directory_itself() {
    let exclude = GlobPredicate::exclude(&pats(&["**/tmp/**"])).unwrap();

    assert!(exclude.is_match("tmp"));
    assert!(exclude.is_match("sub/tmp"));
    assert!(exclude.is_match("tmp/b.txt"));
    assert!(exclude.is_match("sub/tmp/deep/b.txt"));
    assert!(!exclude.is_match("tmpfile.txt"));
    assert!(!exclude.is_match("sub/atmp"));
    assert_eq!(exclude.patterns(), pats(&["**/tmp/**"]).as_slice());
}

#[test]
fn exclude_matches_everything_below_a_matching_directory() {
    let exclude = GlobPredicate::exclude(&pats(&["build"])).unwrap();

    assert!(exclude.is_match("build"));
    assert!(exclude.is_match("build/out/a.o"));
    assert!(!exclude.is_match("src/build.rs"));
}

#[test]
fn include_keeps_its_exact_glob_semantics() {
    let include = GlobPredicate::include(&pats(&["src/**"])).unwrap();

    assert!(include.is_match("src/main.rs"));
    assert!(!include.is_match("src"));
}

#[test]
fn single_star_does_not_cross_directories() {
    let include = GlobPredicate::include(&pats(&["*.rs"])).unwrap();

    assert!(include.is_match("lib.rs"));
    assert!(!include.is_match("src/lib.rs"));
}
