use std::io::Cursor;

use super::*;
use crate::{
    assets::loader::DefaultLoader,
    foundation::error::StorysheetError,
    model::items::SourceRef,
    render::text::LabelRenderer,
};

fn png(rgba: [u8; 4]) -> SourceRef {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba(rgba));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    SourceRef::inline(buf)
}

fn ctx() -> ComposeContext {
    ComposeContext::new(
        Arc::new(DefaultLoader::default()),
        LabelRenderer::with_database(usvg::fontdb::Database::new()),
    )
}

fn collections(frames: usize, props: usize, styles: usize) -> Collections {
    let mut c = Collections::default();
    for _ in 0..frames {
        c.storyboard.add_frame(png([255, 0, 0, 255]));
    }
    for i in 0..props {
        c.props.add(png([0, 255, 0, 255]), format!("prop {i}"));
    }
    for _ in 0..styles {
        c.styles.add(png([0, 0, 255, 255]));
    }
    c
}

#[test]
fn all_roles_present_in_order() {
    let refs = compose_references(&collections(2, 1, 3), &ctx()).unwrap();
    let roles: Vec<Role> = refs.present().map(|c| c.role).collect();
    assert_eq!(roles, Role::ALL.to_vec());
    assert_eq!(refs.get(Role::Layout).map(|c| c.width), Some(1400));
    assert_eq!(refs.get(Role::Style).map(|c| (c.width, c.height)), Some((1200, 400)));
}

#[test]
fn missing_styles_are_omitted() {
    let refs = compose_references(&collections(1, 1, 0), &ctx()).unwrap();
    assert!(refs.style.is_none());
    let roles: Vec<Role> = refs.present().map(|c| c.role).collect();
    assert_eq!(roles, vec![Role::Layout, Role::Props]);
}

#[test]
fn empty_collections_produce_empty_set() {
    let refs = compose_references(&Collections::default(), &ctx()).unwrap();
    assert!(refs.is_empty());
}

#[test]
fn layout_failure_fails_the_run() {
    let mut c = collections(2, 2, 2);
    c.storyboard.add_frame(SourceRef::inline(b"junk".to_vec()));
    let err = compose_references(&c, &ctx()).unwrap_err();
    assert!(matches!(err, StorysheetError::Load(_)));
}

#[test]
fn prop_and_style_failures_do_not_fail_the_run() {
    let mut c = collections(1, 1, 1);
    c.props.add(SourceRef::inline(b"junk".to_vec()), "broken");
    c.styles.add(SourceRef::inline(b"junk".to_vec()));
    let refs = compose_references(&c, &ctx()).unwrap();
    assert_eq!(refs.get(Role::Props).map(|p| p.width), Some(1060));
    assert_eq!(refs.get(Role::Style).map(|s| s.width), Some(800));
}

#[test]
fn tickets_increase() {
    let coord = Coordinator::new(ctx());
    let a = coord.begin();
    let b = coord.begin();
    assert_eq!(a.generation(), 1);
    assert!(b > a);
    assert_eq!(coord.state(), PipelineState::Idle);
}

#[test]
fn stale_completion_is_discarded() {
    let coord = Coordinator::new(ctx());
    let older = coord.begin();
    let newer = coord.begin();

    let newer_refs = coord.compose_all(newer, &collections(2, 0, 0)).unwrap();
    assert!(coord.publish(newer, Ok(newer_refs)));

    let older_refs = coord.compose_all(older, &collections(1, 0, 0)).unwrap();
    assert!(!coord.publish(older, Ok(older_refs)));

    let state = coord.state();
    assert_eq!(state.generation(), 2);
    let refs = state.references().unwrap();
    assert_eq!(refs.get(Role::Layout).map(|c| c.width), Some(1400));
}

#[test]
fn stale_failure_does_not_clear_newer_result() {
    let coord = Coordinator::new(ctx());
    let older = coord.begin();
    let newer = coord.begin();
    assert!(coord.publish(newer, Ok(ReferenceSet::default())));
    assert!(!coord.publish(older, Err(StorysheetError::validation("late"))));
    assert!(coord.state().references().is_some());
}

#[test]
fn failed_run_hides_previous_composites() {
    let coord = Coordinator::new(ctx());
    let ok = coord.refresh(&collections(1, 1, 1));
    assert!(ok.references().is_some());

    let mut broken = collections(1, 0, 0);
    broken
        .storyboard
        .add_frame(SourceRef::File("/nonexistent/frame.png".into()));
    let failed = coord.refresh(&broken);
    match failed {
        PipelineState::Failed {
            generation,
            message,
        } => {
            assert_eq!(generation, 2);
            assert!(message.contains("/nonexistent/frame.png"), "{message}");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[test]
fn unchanged_collections_give_same_geometry() {
    let coord = Coordinator::new(ctx());
    let c = collections(4, 3, 2);
    let first = coord.refresh(&c);
    let second = coord.refresh(&c);
    let (a, b) = (first.references().unwrap(), second.references().unwrap());
    for role in Role::ALL {
        let dims = |r: &ReferenceSet| r.get(role).map(|c| (c.width, c.height));
        assert_eq!(dims(&**a), dims(&**b), "{role}");
    }
    assert_eq!(second.generation(), 2);
}
