use super::*;

fn label(text: &str) -> Label {
    Label {
        text: text.to_string(),
        center_x: 50.0,
        y: 30.0,
        baseline: Baseline::Alphabetic,
        family: "sans-serif",
        size_px: 20.0,
        bold: true,
        color: Rgba8::BLACK,
        max_width: None,
    }
}

#[test]
fn text_element_is_escaped_and_centered() {
    let mut out = String::new();
    write_text_element(&mut out, &label("Prop 1: <salt & \"pepper\">"), None);
    assert!(out.contains(r#"text-anchor="middle""#));
    assert!(out.contains(r#"font-weight="bold""#));
    assert!(out.contains(r#"dominant-baseline="alphabetic""#));
    assert!(out.contains("Prop 1: &lt;salt &amp; &quot;pepper&quot;&gt;"));
    assert!(!out.contains("textLength"));
}

#[test]
fn fit_width_condenses_glyphs() {
    let mut out = String::new();
    let mut l = label("x");
    l.baseline = Baseline::Top;
    write_text_element(&mut out, &l, Some(500.0));
    assert!(out.contains(r#"textLength="500""#));
    assert!(out.contains(r#"lengthAdjust="spacingAndGlyphs""#));
    assert!(out.contains(r#"dominant-baseline="text-before-edge""#));
}

#[test]
fn control_characters_become_spaces() {
    assert_eq!(escape_xml("a\nb\tc"), "a b c");
}

#[test]
fn no_fonts_means_no_layer() {
    let renderer = LabelRenderer::with_database(usvg::fontdb::Database::new());
    assert_eq!(renderer.face_count(), 0);
    assert_eq!(renderer.render_layer(100, 50, &[label("Frame 1")]).unwrap(), None);
}

#[test]
fn empty_label_list_means_no_layer() {
    let renderer = LabelRenderer::new(&[] as &[&str]);
    assert_eq!(renderer.render_layer(10, 10, &[]).unwrap(), None);
}

#[test]
fn labels_draw_ink_when_fonts_exist() {
    let renderer = LabelRenderer::new(&[] as &[&str]);
    if renderer.face_count() == 0 {
        return;
    }
    let layer = renderer
        .render_layer(100, 50, &[label("Frame 1")])
        .unwrap()
        .expect("label layer");
    assert_eq!(layer.len(), 100 * 50 * 4);
    assert!(layer.chunks_exact(4).any(|px| px[3] > 0));
}

#[test]
fn long_labels_are_fitted_to_max_width() {
    let renderer = LabelRenderer::new(&[] as &[&str]);
    if renderer.face_count() == 0 {
        return;
    }
    let mut long = label(&"wide ".repeat(60));
    let natural = renderer.measure(&long).unwrap().expect("glyphs");
    assert!(natural > 100.0);

    long.max_width = Some(100.0);
    long.center_x = 100.0;
    let layer = renderer
        .render_layer(200, 50, &[long])
        .unwrap()
        .expect("label layer");
    for y in 0..50 {
        for x in (0..40).chain(160..200) {
            let i = (y * 200 + x) * 4;
            assert_eq!(layer[i + 3], 0, "ink outside fitted width at ({x}, {y})");
        }
    }
}
