//! Cursor navigation and allocation properties
//!
//! Exercises the binary-tree walk over an allocated region:
//! - growth doubles allocation and selection in lockstep
//! - growth past the maximum depth is refused without touching state
//! - advance visits same-width windows contiguously, carrying upward
//!   (merge) exactly when no same-width sibling remains - the walk
//!   increments like a binary counter

use daoyu::{Cursor, PathOps, VmError};

/// Grow a fresh cursor `k` times.
fn grown(max_depth: u32, k: u32) -> Cursor {
    let mut cursor = Cursor::new(max_depth);
    for _ in 0..k {
        cursor.doalc().unwrap();
    }
    cursor
}

#[test]
fn test_physical_cell_count() {
    for depth in 0..=6 {
        assert_eq!(Cursor::new(depth).store().cell_count(), 1);
    }
    for depth in 7..=12 {
        assert_eq!(Cursor::new(depth).store().cell_count(), 1 << (depth - 6));
    }
}

#[test]
fn test_growth_tracks_selection() {
    let mut cursor = Cursor::new(6);
    assert_eq!(cursor.store().cell_count(), 1);
    assert_eq!(cursor.len(), 1);

    for k in 1..=6 {
        cursor.doalc().unwrap();
        assert_eq!(cursor.alloc(), 1 << k);
        assert_eq!(cursor.alloc_depth(), k);
        assert_eq!(cursor.len(), 1 << k);
        assert_eq!(cursor.len_depth(), k);
    }
}

#[test]
fn test_exhausted_growth_leaves_state_unchanged() {
    let mut cursor = grown(6, 6);
    assert_eq!(cursor.max_depth(), 6);
    let before = (
        cursor.alloc(),
        cursor.alloc_depth(),
        cursor.len(),
        cursor.len_depth(),
        cursor.index(),
    );

    assert_eq!(
        cursor.doalc(),
        Err(VmError::AllocExceeded { max_depth: cursor.max_depth() })
    );

    let after = (
        cursor.alloc(),
        cursor.alloc_depth(),
        cursor.len(),
        cursor.len_depth(),
        cursor.index(),
    );
    assert_eq!(before, after);
}

#[test]
fn test_advance_walks_the_allocation_without_gaps() {
    // alloc 64, then narrow to width-4 windows
    let mut cursor = grown(6, 6);
    for _ in 0..4 {
        cursor.halve().unwrap();
    }
    assert_eq!((cursor.index(), cursor.len()), (0, 4));

    // Each advance either slides to the right sibling or carries up a
    // level; every window it lands on abuts the region already covered.
    let expected = [
        (4, 4),   // right sibling
        (0, 8),   // carry
        (8, 8),   // right sibling at the parent's width
        (0, 16),  // carry
        (16, 16),
        (0, 32),
        (32, 32),
        (0, 64),
        (64, 64), // off the end: the scan guard stops here
    ];
    for &(index, len) in &expected {
        cursor.later().unwrap();
        assert_eq!((cursor.index(), cursor.len()), (index, len));
    }
}

#[test]
fn test_advance_carries_like_a_binary_counter() {
    // From a single-bit window in an 8-bit allocation: slide right,
    // carry up, slide right at the new width, carry again.
    let mut cursor = grown(6, 3);
    for _ in 0..3 {
        cursor.halve().unwrap();
    }
    assert_eq!((cursor.index(), cursor.len()), (0, 1));

    cursor.later().unwrap(); // left child: pure sideways move
    assert_eq!((cursor.index(), cursor.len()), (1, 1));
    cursor.later().unwrap(); // right child: carry repairs the index
    assert_eq!((cursor.index(), cursor.len()), (0, 2));
    cursor.later().unwrap();
    assert_eq!((cursor.index(), cursor.len()), (2, 2));
    cursor.later().unwrap(); // carry
    assert_eq!((cursor.index(), cursor.len()), (0, 4));
    cursor.later().unwrap();
    assert_eq!((cursor.index(), cursor.len()), (4, 4));
    cursor.later().unwrap(); // carry
    assert_eq!((cursor.index(), cursor.len()), (0, 8));
    cursor.later().unwrap(); // off the end of the allocation
    assert_eq!((cursor.index(), cursor.len()), (8, 8));
}

#[test]
fn test_alignment_invariant_holds_across_walk() {
    let mut cursor = grown(8, 8);
    for _ in 0..6 {
        cursor.halve().unwrap();
    }
    // Walk every width-4 window; index stays a multiple of len throughout
    for _ in 0..100 {
        cursor.later().unwrap();
        assert_eq!(cursor.index() % cursor.len(), 0);
        if cursor.index() >= cursor.alloc() {
            break;
        }
    }
}
