use super::*;

fn file(name: &str) -> SourceRef {
    SourceRef::File(name.into())
}

fn names(board: &Storyboard) -> Vec<String> {
    board
        .sequenced()
        .iter()
        .map(|f| f.image.source.to_string())
        .collect()
}

#[test]
fn add_frame_appends_after_highest_order() {
    let mut board = Storyboard::new();
    board.add_frame(file("a"));
    board.insert_frame_with_order(file("b"), 10);
    board.add_frame(file("c"));

    let orders: Vec<i64> = board.frames().iter().map(|f| f.order).collect();
    assert_eq!(orders, vec![0, 10, 11]);
}

#[test]
fn sequenced_is_stable_for_equal_orders() {
    let mut board = Storyboard::new();
    board.insert_frame_with_order(file("late"), 5);
    board.insert_frame_with_order(file("tie-1"), 1);
    board.insert_frame_with_order(file("tie-2"), 1);
    board.insert_frame_with_order(file("first"), -3);

    assert_eq!(names(&board), vec!["first", "tie-1", "tie-2", "late"]);
}

#[test]
fn move_frame_swaps_with_neighbour() {
    let mut board = Storyboard::new();
    let a = board.add_frame(file("a"));
    board.add_frame(file("b"));
    let c = board.add_frame(file("c"));

    assert!(board.move_frame(c, -1).unwrap());
    assert_eq!(names(&board), vec!["a", "c", "b"]);

    assert!(!board.move_frame(a, -1).unwrap());
    assert_eq!(names(&board), vec!["a", "c", "b"]);
}

#[test]
fn move_frame_handles_equal_orders() {
    let mut board = Storyboard::new();
    let x = board.insert_frame_with_order(file("x"), 0);
    board.insert_frame_with_order(file("y"), 0);

    assert!(board.move_frame(x, 1).unwrap());
    assert_eq!(names(&board), vec!["y", "x"]);
}

#[test]
fn repaint_keeps_identity_and_order() {
    let mut board = Storyboard::new();
    let id = board.insert_frame_with_order(file("old"), 7);
    board.repaint(id, file("new")).unwrap();

    let frame = &board.frames()[0];
    assert_eq!(frame.image.id, id);
    assert_eq!(frame.order, 7);
    assert_eq!(frame.image.source, file("new"));

    assert!(board.repaint(SourceId::next(), file("x")).is_err());
}

#[test]
fn remove_and_clear() {
    let mut props = PropSheet::new();
    let hat = props.add(file("hat"), "red hat");
    props.add(file("cane"), "");
    assert_eq!(props.remove(hat).unwrap().description, "red hat");
    assert!(props.remove(hat).is_none());
    assert_eq!(props.len(), 1);
    props.clear();
    assert!(props.is_empty());

    let mut styles = StyleBoard::new();
    let s = styles.add(file("noir"));
    assert!(styles.remove(s).is_some());
    assert!(styles.is_empty());
}

#[test]
fn descriptions_skip_blank_entries() {
    let mut props = PropSheet::new();
    props.add(file("a"), "  umbrella ");
    props.add(file("b"), "");
    props.add(file("c"), "lamp");
    assert_eq!(props.descriptions(), vec!["umbrella", "lamp"]);
}
