//! Byte-offset accessors for a page interpreted as a B+tree node.
//!
//! Every function below trusts its caller to have already initialized the
//! page as the node kind it expects; misuse is a programming error and
//! panics rather than returning a `Result`.
use super::pager::PAGE_SIZE;

pub const NODE_TYPE_INTERNAL: u8 = 0;
pub const NODE_TYPE_LEAF: u8 = 1;

// --- common header ---
const NODE_TYPE_OFFSET: usize = 0;
const NODE_TYPE_SIZE: usize = 1;
const IS_ROOT_OFFSET: usize = NODE_TYPE_OFFSET + NODE_TYPE_SIZE;
const IS_ROOT_SIZE: usize = 1;
const PARENT_POINTER_OFFSET: usize = IS_ROOT_OFFSET + IS_ROOT_SIZE;
const PARENT_POINTER_SIZE: usize = 4;
const COMMON_NODE_HEADER_SIZE: usize = PARENT_POINTER_OFFSET + PARENT_POINTER_SIZE;

// --- leaf header ---
const LEAF_NODE_NUM_CELLS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const LEAF_NODE_NUM_CELLS_SIZE: usize = 4;
const LEAF_NODE_NEXT_LEAF_OFFSET: usize = LEAF_NODE_NUM_CELLS_OFFSET + LEAF_NODE_NUM_CELLS_SIZE;
const LEAF_NODE_NEXT_LEAF_SIZE: usize = 4;
pub const LEAF_NODE_HEADER_SIZE: usize = LEAF_NODE_NEXT_LEAF_OFFSET + LEAF_NODE_NEXT_LEAF_SIZE;

// --- leaf body ---
const LEAF_NODE_KEY_SIZE: usize = 4;
pub const LEAF_NODE_VALUE_SIZE: usize = super::row::ROW_SIZE;
pub const LEAF_NODE_CELL_SIZE: usize = LEAF_NODE_KEY_SIZE + LEAF_NODE_VALUE_SIZE;
pub const LEAF_NODE_SPACE_FOR_CELLS: usize = PAGE_SIZE - LEAF_NODE_HEADER_SIZE;
pub const LEAF_NODE_MAX_CELLS: usize = LEAF_NODE_SPACE_FOR_CELLS / LEAF_NODE_CELL_SIZE;

pub const LEAF_NODE_RIGHT_SPLIT_COUNT: usize = (LEAF_NODE_MAX_CELLS + 1) / 2;
pub const LEAF_NODE_LEFT_SPLIT_COUNT: usize =
    (LEAF_NODE_MAX_CELLS + 1) - LEAF_NODE_RIGHT_SPLIT_COUNT;

// --- internal header ---
const INTERNAL_NODE_NUM_KEYS_OFFSET: usize = COMMON_NODE_HEADER_SIZE;
const INTERNAL_NODE_NUM_KEYS_SIZE: usize = 4;
const INTERNAL_NODE_RIGHT_CHILD_OFFSET: usize =
    INTERNAL_NODE_NUM_KEYS_OFFSET + INTERNAL_NODE_NUM_KEYS_SIZE;
const INTERNAL_NODE_RIGHT_CHILD_SIZE: usize = 4;
pub const INTERNAL_NODE_HEADER_SIZE: usize =
    INTERNAL_NODE_RIGHT_CHILD_OFFSET + INTERNAL_NODE_RIGHT_CHILD_SIZE;

// --- internal body ---
const INTERNAL_NODE_CHILD_SIZE: usize = 4;
const INTERNAL_NODE_KEY_SIZE: usize = 4;
pub const INTERNAL_NODE_CELL_SIZE: usize = INTERNAL_NODE_CHILD_SIZE + INTERNAL_NODE_KEY_SIZE;

/// Deliberately small so the split-unimplemented path (§9 of the engine
/// design notes) is exercised without needing thousands of rows.
pub const INTERNAL_NODE_MAX_CELLS: usize = 3;

/// Sentinel for an internal node's right child before it has been assigned;
/// distinct from page 0 so a freshly-initialized internal node is never
/// mistaken for having the root as a child.
pub const INVALID_PAGE_NUM: u32 = u32::MAX;

type Page = [u8; PAGE_SIZE];

fn get_u32(page: &Page, offset: usize) -> u32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&page[offset..offset + 4]);
    u32::from_le_bytes(bytes)
}

fn set_u32(page: &mut Page, offset: usize, value: u32) {
    page[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

// --- common header accessors ---

pub fn node_type(page: &Page) -> u8 {
    page[NODE_TYPE_OFFSET]
}

pub fn set_node_type(page: &mut Page, value: u8) {
    page[NODE_TYPE_OFFSET] = value;
}

pub fn is_node_leaf(page: &Page) -> bool {
    node_type(page) == NODE_TYPE_LEAF
}

pub fn is_root(page: &Page) -> bool {
    page[IS_ROOT_OFFSET] != 0
}

pub fn set_is_root(page: &mut Page, value: bool) {
    page[IS_ROOT_OFFSET] = value as u8;
}

pub fn parent_page_num(page: &Page) -> u32 {
    get_u32(page, PARENT_POINTER_OFFSET)
}

pub fn set_parent_page_num(page: &mut Page, value: u32) {
    set_u32(page, PARENT_POINTER_OFFSET, value);
}

/// The largest key represented by the subtree rooted at this page.
pub fn max_key(page: &Page) -> u32 {
    if is_node_leaf(page) {
        let n = leaf_node_num_cells(page);
        assert!(n > 0, "max_key called on an empty leaf");
        leaf_node_key(page, n - 1)
    } else {
        let n = internal_node_num_keys(page);
        assert!(n > 0, "max_key called on an empty internal node");
        internal_node_key(page, n - 1)
    }
}

// --- leaf accessors ---

pub fn leaf_node_num_cells(page: &Page) -> u32 {
    get_u32(page, LEAF_NODE_NUM_CELLS_OFFSET)
}

pub fn set_leaf_node_num_cells(page: &mut Page, value: u32) {
    set_u32(page, LEAF_NODE_NUM_CELLS_OFFSET, value);
}

pub fn leaf_node_next_leaf(page: &Page) -> u32 {
    get_u32(page, LEAF_NODE_NEXT_LEAF_OFFSET)
}

pub fn set_leaf_node_next_leaf(page: &mut Page, value: u32) {
    set_u32(page, LEAF_NODE_NEXT_LEAF_OFFSET, value);
}

fn leaf_node_cell_offset(cell_num: u32) -> usize {
    LEAF_NODE_HEADER_SIZE + cell_num as usize * LEAF_NODE_CELL_SIZE
}

pub fn leaf_node_key(page: &Page, cell_num: u32) -> u32 {
    get_u32(page, leaf_node_cell_offset(cell_num))
}

pub fn set_leaf_node_key(page: &mut Page, cell_num: u32, key: u32) {
    let offset = leaf_node_cell_offset(cell_num);
    set_u32(page, offset, key);
}

pub fn leaf_node_value(page: &Page, cell_num: u32) -> &[u8] {
    let offset = leaf_node_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
    &page[offset..offset + LEAF_NODE_VALUE_SIZE]
}

pub fn leaf_node_value_mut(page: &mut Page, cell_num: u32) -> &mut [u8] {
    let offset = leaf_node_cell_offset(cell_num) + LEAF_NODE_KEY_SIZE;
    &mut page[offset..offset + LEAF_NODE_VALUE_SIZE]
}

/// Moves `count` cells starting at `src_cell` to start at `dst_cell`,
/// copying right-to-left when shifting forward so overlapping ranges never
/// alias source over destination before it is read.
pub fn leaf_node_move_cells(page: &mut Page, src_cell: u32, dst_cell: u32, count: u32) {
    if dst_cell > src_cell {
        for i in (0..count).rev() {
            let from = leaf_node_cell_offset(src_cell + i);
            let to = leaf_node_cell_offset(dst_cell + i);
            page.copy_within(from..from + LEAF_NODE_CELL_SIZE, to);
        }
    } else {
        for i in 0..count {
            let from = leaf_node_cell_offset(src_cell + i);
            let to = leaf_node_cell_offset(dst_cell + i);
            page.copy_within(from..from + LEAF_NODE_CELL_SIZE, to);
        }
    }
}

pub fn initialize_leaf_node(page: &mut Page) {
    set_node_type(page, NODE_TYPE_LEAF);
    set_is_root(page, false);
    set_leaf_node_num_cells(page, 0);
    set_leaf_node_next_leaf(page, 0);
}

// --- internal accessors ---

pub fn internal_node_num_keys(page: &Page) -> u32 {
    get_u32(page, INTERNAL_NODE_NUM_KEYS_OFFSET)
}

pub fn set_internal_node_num_keys(page: &mut Page, value: u32) {
    set_u32(page, INTERNAL_NODE_NUM_KEYS_OFFSET, value);
}

pub fn internal_node_right_child(page: &Page) -> u32 {
    get_u32(page, INTERNAL_NODE_RIGHT_CHILD_OFFSET)
}

pub fn set_internal_node_right_child(page: &mut Page, value: u32) {
    set_u32(page, INTERNAL_NODE_RIGHT_CHILD_OFFSET, value);
}

fn internal_node_cell_offset(cell_num: u32) -> usize {
    INTERNAL_NODE_HEADER_SIZE + cell_num as usize * INTERNAL_NODE_CELL_SIZE
}

pub fn internal_node_child_raw(page: &Page, cell_num: u32) -> u32 {
    get_u32(page, internal_node_cell_offset(cell_num))
}

pub fn set_internal_node_child_raw(page: &mut Page, cell_num: u32, child: u32) {
    let offset = internal_node_cell_offset(cell_num);
    set_u32(page, offset, child);
}

pub fn internal_node_key(page: &Page, cell_num: u32) -> u32 {
    get_u32(page, internal_node_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE)
}

pub fn set_internal_node_key(page: &mut Page, cell_num: u32, key: u32) {
    let offset = internal_node_cell_offset(cell_num) + INTERNAL_NODE_CHILD_SIZE;
    set_u32(page, offset, key);
}

/// `cell_num == num_keys` refers to the distinguished right child.
pub fn internal_node_child(page: &Page, cell_num: u32) -> u32 {
    let num_keys = internal_node_num_keys(page);
    if cell_num == num_keys {
        internal_node_right_child(page)
    } else {
        internal_node_child_raw(page, cell_num)
    }
}

pub fn internal_node_move_cells(page: &mut Page, src_cell: u32, dst_cell: u32, count: u32) {
    if dst_cell > src_cell {
        for i in (0..count).rev() {
            let from = internal_node_cell_offset(src_cell + i);
            let to = internal_node_cell_offset(dst_cell + i);
            page.copy_within(from..from + INTERNAL_NODE_CELL_SIZE, to);
        }
    } else {
        for i in 0..count {
            let from = internal_node_cell_offset(src_cell + i);
            let to = internal_node_cell_offset(dst_cell + i);
            page.copy_within(from..from + INTERNAL_NODE_CELL_SIZE, to);
        }
    }
}

pub fn initialize_internal_node(page: &mut Page) {
    set_node_type(page, NODE_TYPE_INTERNAL);
    set_is_root(page, false);
    set_internal_node_num_keys(page, 0);
    set_internal_node_right_child(page, INVALID_PAGE_NUM);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_max_cells_matches_the_documented_split_scenario() {
        assert_eq!(LEAF_NODE_MAX_CELLS, 13);
        assert_eq!(LEAF_NODE_LEFT_SPLIT_COUNT, 7);
        assert_eq!(LEAF_NODE_RIGHT_SPLIT_COUNT, 7);
    }

    #[test]
    fn leaf_header_and_cell_round_trip() {
        let mut page = [0u8; PAGE_SIZE];
        initialize_leaf_node(&mut page);
        assert!(is_node_leaf(&page));
        assert_eq!(leaf_node_num_cells(&page), 0);

        set_leaf_node_num_cells(&mut page, 2);
        set_leaf_node_key(&mut page, 0, 5);
        set_leaf_node_key(&mut page, 1, 9);
        assert_eq!(leaf_node_key(&page, 0), 5);
        assert_eq!(leaf_node_key(&page, 1), 9);
        assert_eq!(max_key(&page), 9);
    }

    #[test]
    fn internal_child_resolves_right_child_sentinel_index() {
        let mut page = [0u8; PAGE_SIZE];
        initialize_internal_node(&mut page);
        set_internal_node_num_keys(&mut page, 1);
        set_internal_node_child_raw(&mut page, 0, 4);
        set_internal_node_key(&mut page, 0, 10);
        set_internal_node_right_child(&mut page, 7);

        assert_eq!(internal_node_child(&page, 0), 4);
        assert_eq!(internal_node_child(&page, 1), 7);
        assert_eq!(max_key(&page), 10);
    }
}
