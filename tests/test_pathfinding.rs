mod common;

use common::{assert_valid_path, parse_scenario, visualize_path};
use gridnav::pathfinding::{find_path, format_path, search, Heuristic, SearchOptions};
use gridnav::simulation::path_efficiency;
use gridnav::{Grid, Position};
use proptest::prelude::*;

const CHEBYSHEV: SearchOptions = SearchOptions {
    heuristic: Heuristic::Chebyshev,
    prevent_corner_cutting: false,
};

#[test]
fn test_wall_with_gap() {
    // Row y=2 blocked for x=0..3, only x=4 is open
    let (grid, start, target) = parse_scenario(
        "
        S....
        .....
        ####.
        .....
        T....
        ",
    );

    let path = find_path(&grid, start, target);
    println!("{}\n{}", format_path(&path), visualize_path(&grid, &path));

    assert_valid_path(&grid, &path);
    assert_eq!(path.first(), Some(&start));
    assert_eq!(path.last(), Some(&target));
    assert!(path.contains(&Position::new(4, 2)), "route must use the gap");
    assert!(path.len() > 5, "longer than the unobstructed minimum");
    assert_eq!(path.len(), 9);

    let efficiency = path_efficiency(&path, target);
    assert!(efficiency < 100);
    assert_eq!(efficiency, 44);
}

#[test]
fn test_enclosed_target_is_unreachable() {
    let (grid, start, target) = parse_scenario(
        "
        S.........
        ..........
        ..........
        ...###....
        ...#T#....
        ...###....
        ..........
        ",
    );

    let result = search(&grid, start, target, &SearchOptions::default());
    assert!(result.path.is_empty());
    assert!(!result.found());
    // Every reachable cell was expanded before giving up
    assert_eq!(result.nodes_expanded, 10 * 7 - 9);
}

#[test]
fn test_full_wall_blocks() {
    let mut grid = Grid::new(10, 10);
    for y in 0..grid.height() {
        grid.set_cell(Position::new(5, y), gridnav::Cell::Obstacle).unwrap();
    }
    assert!(find_path(&grid, Position::new(2, 5), Position::new(8, 5)).is_empty());

    // Opening one cell reconnects the halves on the very next search
    grid.toggle(Position::new(5, 9)).unwrap();
    let path = find_path(&grid, Position::new(2, 5), Position::new(8, 5));
    assert!(path.contains(&Position::new(5, 9)));
    assert_valid_path(&grid, &path);
}

#[test]
fn test_u_shaped_corridor() {
    let (grid, start, target) = parse_scenario(
        "
        ...............
        ...............
        .....######....
        .....#....#....
        .....#....#....
        ..S..#.T..#....
        .....#....#....
        ..........#....
        ...............
        ",
    );

    let path = find_path(&grid, start, target);
    println!("{}", visualize_path(&grid, &path));
    assert_valid_path(&grid, &path);
    assert_eq!(path.last(), Some(&target));
    assert!(path.contains(&Position::new(5, 7)) || path.contains(&Position::new(6, 7)));
}

#[test]
fn test_manhattan_overshoots_where_chebyshev_does_not() {
    let (grid, start, target) = parse_scenario(
        "
        .......
        ......#
        ..#..#.
        S..###T
        ....#..
        .......
        #......
        ",
    );

    let manhattan = find_path(&grid, start, target);
    let chebyshev = search(&grid, start, target, &CHEBYSHEV).path;
    assert_valid_path(&grid, &manhattan);
    assert_valid_path(&grid, &chebyshev);

    assert_eq!(chebyshev.len(), 7);
    assert_eq!(manhattan.len(), 8);
}

#[test]
fn test_diagonal_may_squeeze_between_obstacles() {
    let (grid, start, target) = parse_scenario(
        "
        S#.
        #..
        ..T
        ",
    );

    let path = find_path(&grid, start, target);
    assert_eq!(path, vec![start, Position::new(1, 1), target]);

    let strict = SearchOptions {
        prevent_corner_cutting: true,
        ..Default::default()
    };
    assert!(search(&grid, start, target, &strict).path.is_empty());
}

#[test]
fn test_search_is_repeatable() {
    let (grid, start, target) = parse_scenario(
        "
        S.#.......
        ..#..##...
        ..#...#...
        ......#..T
        ",
    );

    let first = find_path(&grid, start, target);
    let second = find_path(&grid, start, target);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

proptest! {
    /// Start equal to target yields just that cell
    #[test]
    fn start_equals_target(x in 0i32..12, y in 0i32..12) {
        let grid = Grid::new(12, 12);
        let p = Position::new(x, y);
        prop_assert_eq!(find_path(&grid, p, p), vec![p]);
    }

    /// On an open grid the path has exactly max(|dx|, |dy|) + 1 nodes
    #[test]
    fn open_grid_path_length(
        sx in 0i32..15, sy in 0i32..15,
        tx in 0i32..15, ty in 0i32..15,
    ) {
        let grid = Grid::new(15, 15);
        let start = Position::new(sx, sy);
        let target = Position::new(tx, ty);
        let expected = start.chebyshev(&target) as usize + 1;

        let path = find_path(&grid, start, target);
        prop_assert_eq!(path.len(), expected);
        prop_assert_eq!(path[0], start);
        prop_assert_eq!(*path.last().unwrap(), target);

        let chebyshev = search(&grid, start, target, &CHEBYSHEV).path;
        prop_assert_eq!(chebyshev.len(), expected);
    }

    /// Identical inputs give identical paths, obstacles or not
    #[test]
    fn search_is_deterministic(
        obstacles in prop::collection::vec((0i32..10, 0i32..10), 0..30),
        sx in 0i32..10, sy in 0i32..10,
        tx in 0i32..10, ty in 0i32..10,
    ) {
        let obstacles: Vec<Position> = obstacles.into_iter().map(|(x, y)| Position::new(x, y)).collect();
        let grid = Grid::with_obstacles(10, 10, &obstacles);
        let start = Position::new(sx, sy);
        let target = Position::new(tx, ty);

        let first = find_path(&grid, start, target);
        let second = find_path(&grid, start, target);
        prop_assert_eq!(&first, &second);

        if let (Some(first_node), Some(last_node)) = (first.first(), first.last()) {
            prop_assert_eq!(*first_node, start);
            prop_assert_eq!(*last_node, target);
            prop_assert!(first.len() > start.chebyshev(&target) as usize);
        }
    }
}
