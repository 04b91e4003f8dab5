//! The B+tree itself: insertion, leaf splitting, and root creation sit here,
//! built on top of the page-buffer accessors in `node` and the page cache in
//! `pager`.
use super::cursor::{self, Cursor};
use super::node::*;
use super::pager::Pager;
use super::row::Row;
use crate::err;
use crate::errors::Error;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

pub struct Table {
    pub pager: Pager,
    pub root_page_num: u32,
}

impl Table {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let mut pager = Pager::open(path)?;
        let is_new = pager.num_pages == 0;
        let mut table = Table {
            pager,
            root_page_num: 0,
        };
        if is_new {
            let root = table.pager.get_page(0)?;
            initialize_leaf_node(root);
            set_is_root(root, true);
        }
        Ok(table)
    }

    pub fn close(&mut self) -> Result<(), Error> {
        for page_num in 0..self.pager.num_pages {
            self.pager.flush(page_num)?;
        }
        self.pager.close()
    }

    pub fn insert(&mut self, row: &Row) -> Result<(), Error> {
        table_insert(self, row)
    }

    pub fn select(&mut self, out: &mut dyn Write) -> Result<(), Error> {
        let mut c = cursor::table_start(self)?;
        while !c.end_of_table {
            let value = cursor::cursor_value(self, &c)?;
            let row = Row::deserialize(value);
            writeln!(out, "{}", row).map_err(|e| err!(Io, "{}", e))?;
            cursor::cursor_advance(self, &mut c)?;
        }
        Ok(())
    }
}

fn table_insert(table: &mut Table, row: &Row) -> Result<(), Error> {
    let c = cursor::table_find(table, row.id)?;

    let page = table.pager.get_page(c.page_num)?;
    if c.cell_num < leaf_node_num_cells(page) && leaf_node_key(page, c.cell_num) == row.id {
        warn!(id = row.id, page_num = c.page_num, "duplicate key rejected");
        return Err(err!(DuplicateKey, "id {} already exists", row.id));
    }

    leaf_insert(table, c, row.id, &row.serialize())
}

fn leaf_insert(table: &mut Table, c: Cursor, key: u32, value: &[u8]) -> Result<(), Error> {
    let page = table.pager.get_page(c.page_num)?;
    let num_cells = leaf_node_num_cells(page);

    if num_cells as usize >= LEAF_NODE_MAX_CELLS {
        return leaf_split_and_insert(table, c, key, value);
    }

    if c.cell_num < num_cells {
        leaf_node_move_cells(page, c.cell_num, c.cell_num + 1, num_cells - c.cell_num);
    }
    set_leaf_node_num_cells(page, num_cells + 1);
    set_leaf_node_key(page, c.cell_num, key);
    leaf_node_value_mut(page, c.cell_num).copy_from_slice(value);
    Ok(())
}

fn leaf_split_and_insert(table: &mut Table, c: Cursor, key: u32, value: &[u8]) -> Result<(), Error> {
    let old_page_num = c.page_num;
    let old_max = max_key(table.pager.get_page(old_page_num)?);
    let was_root = is_root(table.pager.get_page(old_page_num)?);
    let parent_page_num = parent_page_num(table.pager.get_page(old_page_num)?);

    let new_page_num = table.pager.unused_page_num();
    {
        let new_page = table.pager.get_page(new_page_num)?;
        initialize_leaf_node(new_page);
        set_parent_page_num(new_page, parent_page_num);
    }

    // splice the new leaf into the linked chain before redistributing cells
    {
        let old_next = leaf_node_next_leaf(table.pager.get_page(old_page_num)?);
        let new_page = table.pager.get_page(new_page_num)?;
        set_leaf_node_next_leaf(new_page, old_next);
    }
    {
        let old_page = table.pager.get_page(old_page_num)?;
        set_leaf_node_next_leaf(old_page, new_page_num);
    }

    // Redistribute LEAF_NODE_MAX_CELLS + 1 logical cells (existing cells plus
    // the one being inserted) across the two leaves, right-to-left so moving
    // a cell never overwrites one not yet read.
    for i in (0..=LEAF_NODE_MAX_CELLS as u32).rev() {
        let destination_leaf_is_new = i as usize >= LEAF_NODE_LEFT_SPLIT_COUNT;
        let dest_page_num = if destination_leaf_is_new {
            new_page_num
        } else {
            old_page_num
        };
        let index_within_leaf = i as usize % LEAF_NODE_LEFT_SPLIT_COUNT;

        if i == c.cell_num {
            let dest_page = table.pager.get_page(dest_page_num)?;
            set_leaf_node_key(dest_page, index_within_leaf as u32, key);
            leaf_node_value_mut(dest_page, index_within_leaf as u32).copy_from_slice(value);
        } else if i > c.cell_num {
            let source_index = i - 1;
            let (src_key, src_value) = {
                let old_page = table.pager.get_page(old_page_num)?;
                (
                    leaf_node_key(old_page, source_index),
                    leaf_node_value(old_page, source_index).to_vec(),
                )
            };
            let dest_page = table.pager.get_page(dest_page_num)?;
            set_leaf_node_key(dest_page, index_within_leaf as u32, src_key);
            leaf_node_value_mut(dest_page, index_within_leaf as u32).copy_from_slice(&src_value);
        } else {
            let (src_key, src_value) = {
                let old_page = table.pager.get_page(old_page_num)?;
                (leaf_node_key(old_page, i), leaf_node_value(old_page, i).to_vec())
            };
            let dest_page = table.pager.get_page(dest_page_num)?;
            set_leaf_node_key(dest_page, index_within_leaf as u32, src_key);
            leaf_node_value_mut(dest_page, index_within_leaf as u32).copy_from_slice(&src_value);
        }
    }

    set_leaf_node_num_cells(table.pager.get_page(old_page_num)?, LEAF_NODE_LEFT_SPLIT_COUNT as u32);
    set_leaf_node_num_cells(table.pager.get_page(new_page_num)?, LEAF_NODE_RIGHT_SPLIT_COUNT as u32);

    warn!(
        old_page_num,
        new_page_num,
        left_cells = LEAF_NODE_LEFT_SPLIT_COUNT,
        right_cells = LEAF_NODE_RIGHT_SPLIT_COUNT,
        "leaf node split"
    );

    if was_root {
        return create_new_root(table, new_page_num);
    }

    let new_old_max = max_key(table.pager.get_page(old_page_num)?);
    update_internal_node_key(table, parent_page_num, old_max, new_old_max)?;
    internal_node_insert(table, parent_page_num, new_page_num)
}

fn update_internal_node_key(
    table: &mut Table,
    parent_page_num: u32,
    old_key: u32,
    new_key: u32,
) -> Result<(), Error> {
    let page = table.pager.get_page(parent_page_num)?;
    let num_keys = internal_node_num_keys(page);
    let index = (0..num_keys)
        .find(|&i| internal_node_key(page, i) == old_key)
        .unwrap_or(num_keys);
    if index < num_keys {
        set_internal_node_key(page, index, new_key);
    }
    Ok(())
}

fn internal_node_insert(table: &mut Table, parent_page_num: u32, child_page_num: u32) -> Result<(), Error> {
    let child_max = max_key(table.pager.get_page(child_page_num)?);

    let parent = table.pager.get_page(parent_page_num)?;
    let num_keys = internal_node_num_keys(parent);

    if num_keys as usize >= INTERNAL_NODE_MAX_CELLS {
        return Err(err!(
            NotImplemented,
            "internal node {} is full ({} keys); splitting internal nodes is not implemented",
            parent_page_num,
            num_keys
        ));
    }

    let right_child_page_num = internal_node_right_child(parent);
    let right_child_max = max_key(table.pager.get_page(right_child_page_num)?);

    let parent = table.pager.get_page(parent_page_num)?;
    set_internal_node_num_keys(parent, num_keys + 1);

    if child_max > right_child_max {
        set_internal_node_child_raw(parent, num_keys, right_child_page_num);
        set_internal_node_key(parent, num_keys, right_child_max);
        set_internal_node_right_child(parent, child_page_num);
    } else {
        let index = (0..num_keys)
            .find(|&i| internal_node_key(parent, i) >= child_max)
            .unwrap_or(num_keys);
        internal_node_move_cells(parent, index, index + 1, num_keys - index);
        set_internal_node_child_raw(parent, index, child_page_num);
        set_internal_node_key(parent, index, child_max);
    }

    set_parent_page_num(table.pager.get_page(child_page_num)?, parent_page_num);
    Ok(())
}

/// Copies the current root's contents into a fresh page, then reinitializes
/// the root page (which always stays page 0) as an internal node with two
/// children: the copied-out old root and the freshly split-off sibling.
fn create_new_root(table: &mut Table, right_child_page_num: u32) -> Result<(), Error> {
    let root_page_num = table.root_page_num;
    let left_child_page_num = table.pager.unused_page_num();

    {
        let root_copy = *table.pager.get_page(root_page_num)?;
        let left_child = table.pager.get_page(left_child_page_num)?;
        *left_child = root_copy;
        set_is_root(left_child, false);
    }

    let left_child_max = max_key(table.pager.get_page(left_child_page_num)?);

    let root = table.pager.get_page(root_page_num)?;
    initialize_internal_node(root);
    set_is_root(root, true);
    set_internal_node_num_keys(root, 1);
    set_internal_node_child_raw(root, 0, left_child_page_num);
    set_internal_node_key(root, 0, left_child_max);
    set_internal_node_right_child(root, right_child_page_num);

    set_parent_page_num(table.pager.get_page(left_child_page_num)?, root_page_num);
    set_parent_page_num(table.pager.get_page(right_child_page_num)?, root_page_num);

    info!(
        root_page_num,
        left_child_page_num, right_child_page_num, "created new root"
    );
    Ok(())
}
