use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        StorysheetError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        StorysheetError::encoding("x")
            .to_string()
            .contains("encoding error:")
    );
    assert!(
        StorysheetError::config("x")
            .to_string()
            .contains("config error:")
    );
    assert!(
        StorysheetError::load("a.png", "x")
            .to_string()
            .contains("load error:")
    );
}

#[test]
fn load_error_names_the_reference() {
    let err = StorysheetError::load("https://example.com/cat.png", "status 404");
    let msg = err.to_string();
    assert!(msg.contains("https://example.com/cat.png"));
    assert!(msg.contains("status 404"));

    let StorysheetError::Load(inner) = err else {
        panic!("expected a load error");
    };
    assert_eq!(inner.reference, "https://example.com/cat.png");
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = StorysheetError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
