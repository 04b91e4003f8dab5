//! Key-ordered search cursor over the B+tree.
use super::node::{
    internal_node_child, internal_node_key, internal_node_num_keys, is_node_leaf, leaf_node_key,
    leaf_node_next_leaf, leaf_node_num_cells, leaf_node_value,
};
use super::table::Table;
use crate::errors::Error;

/// Points at a specific cell in a specific leaf. Does not borrow the table;
/// every operation that needs page contents takes `&mut Table` explicitly.
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    pub page_num: u32,
    pub cell_num: u32,
    pub end_of_table: bool,
}

/// Binary search over `[low, high)` for the smallest index whose key is
/// `>= target`, breaking ties toward the left on equal keys.
fn search_leftmost<F: Fn(u32) -> u32>(mut low: u32, mut high: u32, target: u32, key_at: F) -> u32 {
    while low < high {
        let mid = low + (high - low) / 2;
        if key_at(mid) >= target {
            high = mid;
        } else {
            low = mid + 1;
        }
    }
    low
}

pub fn table_start(table: &mut Table) -> Result<Cursor, Error> {
    let mut cursor = table_find(table, 0)?;
    let page = table.pager.get_page(cursor.page_num)?;
    cursor.end_of_table = leaf_node_num_cells(page) == 0;
    Ok(cursor)
}

/// Descends from the root to the leaf that does or should contain `key`.
pub fn table_find(table: &mut Table, key: u32) -> Result<Cursor, Error> {
    let root_page_num = table.root_page_num;
    find_from(table, root_page_num, key)
}

fn find_from(table: &mut Table, page_num: u32, key: u32) -> Result<Cursor, Error> {
    let page = table.pager.get_page(page_num)?;
    if is_node_leaf(page) {
        let num_cells = leaf_node_num_cells(page);
        let cell_num = search_leftmost(0, num_cells, key, |i| leaf_node_key(page, i));
        return Ok(Cursor {
            page_num,
            cell_num,
            end_of_table: false,
        });
    }

    let num_keys = internal_node_num_keys(page);
    let child_index = search_leftmost(0, num_keys, key, |i| internal_node_key(page, i));
    let child_page_num = internal_node_child(page, child_index);
    find_from(table, child_page_num, key)
}

pub fn cursor_value<'a>(table: &'a mut Table, cursor: &Cursor) -> Result<&'a [u8], Error> {
    let page = table.pager.get_page(cursor.page_num)?;
    Ok(leaf_node_value(page, cursor.cell_num))
}

pub fn cursor_advance(table: &mut Table, cursor: &mut Cursor) -> Result<(), Error> {
    let page = table.pager.get_page(cursor.page_num)?;
    cursor.cell_num += 1;
    if cursor.cell_num >= leaf_node_num_cells(page) {
        let next = leaf_node_next_leaf(page);
        if next == 0 {
            cursor.end_of_table = true;
        } else {
            cursor.page_num = next;
            cursor.cell_num = 0;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #[test]
    fn search_leftmost_ties_toward_the_left() {
        let keys = [1u32, 3, 3, 3, 7];
        let idx = super::search_leftmost(0, keys.len() as u32, 3, |i| keys[i as usize]);
        assert_eq!(idx, 1);
    }

    #[test]
    fn search_leftmost_places_missing_key_at_insertion_point() {
        let keys = [1u32, 3, 7];
        let idx = super::search_leftmost(0, keys.len() as u32, 5, |i| keys[i as usize]);
        assert_eq!(idx, 2);
    }
}
