use super::*;

#[test]
fn intersect_and_union_behave() {
    let a = Rect::new(0, 0, 10, 10);
    let b = Rect::new(5, -5, 10, 10);
    assert_eq!(a.intersect(b), Rect::new(5, 0, 5, 5));
    assert_eq!(a.union(b), Rect::new(0, -5, 15, 15));

    let far = Rect::new(20, 20, 2, 2);
    assert!(a.intersect(far).is_empty());
    assert!(!a.intersects(far));
    assert_eq!(a.union(Rect::default()), a);
}

#[test]
fn contains_uses_half_open_edges() {
    let r = Rect::new(-2, 3, 4, 2);
    assert!(r.contains(-2, 3));
    assert!(r.contains(1, 4));
    assert!(!r.contains(2, 4));
    assert!(!r.contains(1, 5));
    assert!(r.contains_rect(Rect::new(-1, 3, 3, 2)));
    assert!(!r.contains_rect(Rect::new(-1, 3, 4, 2)));
    assert!(r.contains_rect(Rect::new(100, 100, 0, 5)));
    assert_eq!(r.local(0, 4), Some((2, 1)));
    assert_eq!(r.local(5, 4), None);
}

#[test]
fn tile_grid_clips_last_row_and_column() {
    let grid = TileGrid::new(Rect::new(10, 20, 10, 5), 4, 4).unwrap();
    assert_eq!(grid.columns(), 3);
    assert_eq!(grid.rows(), 2);
    assert_eq!(grid.len(), 6);

    let tiles: Vec<Rect> = grid.tiles().collect();
    assert_eq!(tiles[0], Rect::new(10, 20, 4, 4));
    assert_eq!(tiles[2], Rect::new(18, 20, 2, 4));
    assert_eq!(tiles[5], Rect::new(18, 24, 2, 1));

    let covered: u64 = tiles.iter().map(|t| t.area()).sum();
    assert_eq!(covered, grid.bounds().area());
}

#[test]
fn tile_grid_rejects_zero_tiles() {
    assert!(TileGrid::new(Rect::from_size(4, 4), 0, 4).is_err());
    let empty = TileGrid::new(Rect::from_size(0, 4), 2, 2).unwrap();
    assert!(empty.is_empty());
}
