use rindex::{GridRect, HilbertTree};
use std::collections::HashSet;

fn rect(lo: [i64; 2], hi: [i64; 2]) -> GridRect {
    GridRect::new(lo.to_vec(), hi.to_vec()).unwrap()
}

fn payloads(found: Vec<&i32>) -> HashSet<i32> {
    found.into_iter().copied().collect()
}

fn tree(min: usize, max: usize) -> HilbertTree<i32> {
    HilbertTree::new(min, max, 2, 16).unwrap()
}

#[test]
fn test_insert_single_element() {
    let mut tree = tree(2, 5);
    tree.insert(rect([0, 0], [10, 10]), 42).unwrap();

    assert_eq!(tree.search(&rect([0, 0], [10, 10])), vec![&42]);
}

#[test]
fn test_insert_multiple_elements() {
    let mut tree = tree(2, 4);
    for i in 0..5i64 {
        tree.insert(rect([i * 10, i * 10], [i * 10 + 10, i * 10 + 10]), i as i32)
            .unwrap();
    }

    let results = tree.search(&rect([0, 0], [100, 100]));
    assert_eq!(results.len(), 5);
}

#[test]
fn test_insert_overlapping_rectangles() {
    let mut tree = tree(2, 4);
    tree.insert(rect([0, 0], [50, 50]), 10).unwrap();
    tree.insert(rect([30, 30], [80, 80]), 20).unwrap();
    tree.insert(rect([40, 40], [60, 60]), 30).unwrap();

    let results = tree.search(&rect([40, 40], [50, 50]));
    assert_eq!(results.len(), 3);
}

#[test]
fn test_insert_triggering_split() {
    let mut tree = tree(2, 4);
    for i in 0..10i64 {
        tree.insert(rect([i * 10, i * 10], [i * 10 + 5, i * 10 + 5]), i as i32)
            .unwrap();
    }

    let results = tree.search(&rect([-10, -10], [200, 200]));
    assert_eq!(payloads(results), (0..10).collect());
}

#[test]
fn test_search_empty_tree() {
    let tree = tree(2, 4);
    assert!(tree.search(&rect([0, 0], [100, 100])).is_empty());
}

#[test]
fn test_search_no_overlap() {
    let mut tree = tree(2, 4);
    tree.insert(rect([0, 0], [10, 10]), 42).unwrap();
    assert!(tree.search(&rect([100, 100], [200, 200])).is_empty());
}

#[test]
fn test_search_partial_overlap() {
    let mut tree = tree(2, 4);
    tree.insert(rect([0, 0], [20, 20]), 1).unwrap();
    tree.insert(rect([50, 50], [70, 70]), 2).unwrap();
    tree.insert(rect([100, 100], [120, 120]), 3).unwrap();
    tree.insert(rect([10, 10], [30, 30]), 4).unwrap();
    tree.insert(rect([80, 80], [90, 90]), 5).unwrap();

    let results = tree.search(&rect([0, 0], [60, 60]));
    assert_eq!(payloads(results), HashSet::from([1, 2, 4]));
}

#[test]
fn test_point_query() {
    let mut tree = tree(2, 4);
    tree.insert(rect([50, 50], [100, 100]), 99).unwrap();

    let results = tree.search(&rect([70, 70], [70, 70]));
    assert_eq!(results, vec![&99]);
}

#[test]
fn test_search_with_exact_boundaries() {
    let mut tree = tree(2, 4);
    tree.insert(rect([0, 0], [50, 50]), 10).unwrap();
    tree.insert(rect([50, 50], [100, 100]), 20).unwrap();
    tree.insert(rect([100, 100], [150, 150]), 30).unwrap();

    let results = tree.search(&rect([0, 0], [50, 50]));
    assert!(results.len() >= 2);
}

#[test]
fn test_delete_single_element() {
    let mut tree = tree(2, 4);
    let r = rect([0, 0], [10, 10]);
    tree.insert(r.clone(), 42).unwrap();
    tree.remove(&r).unwrap();

    assert!(tree.search(&r).is_empty());
    assert!(tree.is_empty());
}

#[test]
fn test_delete_from_multiple_elements() {
    let mut tree = tree(2, 4);
    let mut rects = Vec::new();
    for i in 0..5i64 {
        let r = rect([i * 10, i * 10], [i * 10 + 10, i * 10 + 10]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }
    tree.remove(&rects[2]).unwrap();

    let results = tree.search(&rect([0, 0], [100, 100]));
    assert_eq!(payloads(results), HashSet::from([0, 1, 3, 4]));
}

#[test]
fn test_delete_nonexistent_is_noop() {
    let mut tree = tree(2, 4);
    tree.insert(rect([0, 0], [10, 10]), 42).unwrap();
    tree.remove(&rect([100, 100], [110, 110])).unwrap();

    assert_eq!(tree.search(&rect([0, 0], [10, 10])).len(), 1);
}

#[test]
fn test_delete_and_reinsert() {
    let mut tree = tree(2, 4);
    let r = rect([0, 0], [50, 50]);
    tree.insert(r.clone(), 10).unwrap();
    tree.remove(&r).unwrap();
    tree.insert(r.clone(), 20).unwrap();

    assert_eq!(tree.search(&r), vec![&20]);
}

#[test]
fn test_delete_multiple_sequential() {
    let mut tree = tree(2, 4);
    let mut rects = Vec::new();
    for i in 0..8i64 {
        let r = rect([i * 10, i * 10], [i * 10 + 10, i * 10 + 10]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }
    tree.remove(&rects[1]).unwrap();
    tree.remove(&rects[3]).unwrap();
    tree.remove(&rects[5]).unwrap();

    let results = tree.search(&rect([-10, -10], [200, 200]));
    assert_eq!(payloads(results), HashSet::from([0, 2, 4, 6, 7]));
}

#[test]
fn test_delete_every_other_element() {
    let mut tree = tree(2, 4);
    let mut rects = Vec::new();
    for i in 0..20i64 {
        let r = rect([i * 10, i * 10], [i * 10 + 8, i * 10 + 8]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }
    for r in rects.iter().step_by(2) {
        tree.remove(r).unwrap();
    }

    let results = tree.search(&rect([-10, -10], [250, 250]));
    assert_eq!(results.len(), 10);
}

#[test]
fn test_delete_from_single_element_tree_and_reinsert() {
    let mut tree = tree(2, 4);
    let r = rect([0, 0], [10, 10]);
    tree.insert(r.clone(), 42).unwrap();
    tree.remove(&r).unwrap();

    let r2 = rect([50, 50], [60, 60]);
    tree.insert(r2.clone(), 99).unwrap();

    assert_eq!(tree.search(&r2), vec![&99]);
}

#[test]
fn test_3d_rectangles() {
    let mut tree: HilbertTree<i32> = HilbertTree::new(2, 4, 3, 8).unwrap();
    let r = GridRect::new(vec![0, 0, 0], vec![10, 10, 10]).unwrap();
    tree.insert(r.clone(), 42).unwrap();
    assert_eq!(tree.search(&r), vec![&42]);
}

#[test]
fn test_high_dimensional_5d() {
    let mut tree: HilbertTree<i32> = HilbertTree::new(2, 4, 5, 8).unwrap();
    let r = GridRect::new(vec![0; 5], vec![10; 5]).unwrap();
    tree.insert(r.clone(), 42).unwrap();
    assert_eq!(tree.search(&r), vec![&42]);
}

#[test]
fn test_zero_area_rectangle() {
    let mut tree = tree(2, 4);
    let point = rect([50, 50], [50, 50]);
    tree.insert(point.clone(), 42).unwrap();
    assert_eq!(tree.search(&point), vec![&42]);
}

#[test]
fn test_insert_identical_rectangles() {
    let mut tree = tree(2, 4);
    let shared = rect([50, 50], [100, 100]);
    for i in 0..5 {
        tree.insert(shared.clone(), i).unwrap();
    }

    let results = tree.search(&shared);
    assert_eq!(results.len(), 5);
    assert_eq!(payloads(results), (0..5).collect());
}

#[test]
fn test_delete_duplicates_one_per_call() {
    let mut tree = tree(2, 4);
    let shared = rect([50, 50], [100, 100]);
    for i in 0..5 {
        tree.insert(shared.clone(), i).unwrap();
    }
    tree.remove(&shared).unwrap();
    tree.remove(&shared).unwrap();

    assert_eq!(tree.search(&shared).len(), 3);
}

#[test]
fn test_mixed_insert_delete_operations() {
    let mut tree = tree(2, 4);
    let mut rects = Vec::new();

    for i in 0..5i64 {
        let r = rect([i * 10, i * 10], [i * 10 + 10, i * 10 + 10]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }
    tree.remove(&rects[1]).unwrap();
    tree.remove(&rects[3]).unwrap();

    for i in 5..10i64 {
        let r = rect([i * 10, i * 10], [i * 10 + 10, i * 10 + 10]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }
    tree.remove(&rects[2]).unwrap();
    tree.remove(&rects[6]).unwrap();
    tree.remove(&rects[8]).unwrap();

    for i in 10..15i64 {
        let r = rect([i * 10, i * 10], [i * 10 + 10, i * 10 + 10]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }

    let results = tree.search(&rect([-10, -10], [200, 200]));
    assert_eq!(results.len(), 10);
}

#[test]
fn test_insert_and_search_large_dataset() {
    let mut tree = tree(4, 8);
    for i in 0..1000i64 {
        let x = (i % 50) * 20;
        let y = (i / 50) * 20;
        tree.insert(rect([x, y], [x + 15, y + 15]), i as i32).unwrap();
    }

    let results = tree.search(&rect([-10, -10], [2000, 2000]));
    assert_eq!(results.len(), 1000);
}

#[test]
fn test_deep_tree_with_condense() {
    let mut tree = tree(2, 4);
    let mut rects = Vec::new();
    for i in 0..100i64 {
        let cluster_x = (i / 25) * 100;
        let cluster_y = (i % 25) * 5;
        let x = cluster_x + (i % 5);
        let y = cluster_y;
        let r = rect([x, y], [x + 1, y + 1]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }

    for cluster in 0..4usize {
        for offset in 0..5 {
            tree.remove(&rects[cluster * 25 + offset]).unwrap();
        }
    }

    let results = tree.search(&rect([-100, -100], [500, 500]));
    assert_eq!(results.len(), 80);
}

#[test]
fn test_extreme_condense() {
    let mut tree = HilbertTree::new(10, 40, 2, 16).unwrap();
    let mut rects = Vec::new();
    for i in 0..2000i64 {
        let cluster_id = i / 20;
        let within = i % 20;
        let x = cluster_id * 500 + (within % 4) * 10;
        let y = cluster_id * 500 + (within / 4) * 10;
        let r = rect([x, y], [x + 5, y + 5]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }

    // Remove every other cluster among the first ten.
    for cluster in (0..10usize).step_by(2) {
        for offset in 0..20 {
            tree.remove(&rects[cluster * 20 + offset]).unwrap();
        }
    }

    let results = tree.search(&rect([-500, -500], [4900, 4900]));
    assert_eq!(results.len(), 100);
}

#[test]
fn test_sequential_delete_and_reinsert_cycles() {
    let mut tree = tree(2, 4);
    let mut rects = Vec::new();
    for i in 0..50i64 {
        let x = (i % 7) * 20;
        let y = (i / 7) * 20;
        let r = rect([x, y], [x + 10, y + 10]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }

    for cycle in 0..3usize {
        let mut deleted = Vec::new();
        let mut i = cycle;
        while i < 50 {
            tree.remove(&rects[i]).unwrap();
            deleted.push(i);
            i += 5;
        }
        for idx in deleted {
            tree.insert(rects[idx].clone(), idx as i32).unwrap();
        }

        let results = tree.search(&rect([-50, -50], [200, 200]));
        assert_eq!(results.len(), 50, "cycle {cycle} lost entries");
    }
}

#[test]
fn test_massive_deletions() {
    let mut tree = tree(2, 4);
    let mut rects = Vec::new();
    for i in 0..150i64 {
        let x = (i % 12) * 15;
        let y = (i / 12) * 15;
        let r = rect([x, y], [x + 8, y + 8]);
        rects.push(r.clone());
        tree.insert(r, i as i32).unwrap();
    }
    for r in rects.iter().take(100) {
        tree.remove(r).unwrap();
    }

    let results = tree.search(&rect([-100, -100], [500, 500]));
    assert_eq!(results.len(), 50);
}

#[test]
fn test_mass_delete_reinsert_stability() {
    // 50k entries on a grid; delete 30k, reinsert them, and the
    // whole-space search must return exactly the original multiset.
    const N: i64 = 50_000;
    const DELETED: i64 = 30_000;
    const COLS: i64 = 224;

    let grid_rect = |i: i64| {
        let x = (i % COLS) * 3;
        let y = (i / COLS) * 3;
        rect([x, y], [x + 1, y + 1])
    };

    let mut tree: HilbertTree<i32> = HilbertTree::new(8, 16, 2, 16).unwrap();
    for i in 0..N {
        tree.insert(grid_rect(i), i as i32).unwrap();
    }
    for i in 0..DELETED {
        tree.remove(&grid_rect(i)).unwrap();
    }
    assert_eq!(tree.len(), (N - DELETED) as usize);

    for i in 0..DELETED {
        tree.insert(grid_rect(i), i as i32).unwrap();
    }

    let everything = rect([-10, -10], [5000, 5000]);
    let results = tree.search(&everything);
    assert_eq!(results.len(), N as usize);
    assert_eq!(payloads(results).len(), N as usize, "duplicate payloads");
}
