//! File-backed page cache. Owns all I/O; knows nothing about node layout.
use crate::err;
use crate::errors::Error;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, trace, warn};

pub const PAGE_SIZE: usize = 4096;
pub const TABLE_MAX_PAGES: usize = 100;

pub struct Pager {
    file: File,
    file_length: u64,
    pub num_pages: u32,
    pages: Vec<Option<Box<[u8; PAGE_SIZE]>>>,
}

impl Pager {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;

        let file_length = file.metadata()?.len();
        if file_length % PAGE_SIZE as u64 != 0 {
            warn!(
                file_length,
                "database file length is not a multiple of the page size"
            );
            return Err(err!(
                Corrupt,
                "db file length {} is not a multiple of page size {}",
                file_length,
                PAGE_SIZE
            ));
        }

        let num_pages = (file_length / PAGE_SIZE as u64) as u32;
        let mut pages = Vec::with_capacity(TABLE_MAX_PAGES);
        pages.resize_with(TABLE_MAX_PAGES, || None);

        Ok(Pager {
            file,
            file_length,
            num_pages,
            pages,
        })
    }

    /// Materializes and returns the page at `page_num`, reading it from disk
    /// on first touch if it already exists there, else handing back zeroed
    /// bytes.
    pub fn get_page(&mut self, page_num: u32) -> Result<&mut [u8; PAGE_SIZE], Error> {
        if page_num as usize > TABLE_MAX_PAGES {
            return Err(err!(
                OutOfRange,
                "page number {} exceeds max pages {}",
                page_num,
                TABLE_MAX_PAGES
            ));
        }

        let idx = page_num as usize;
        if self.pages[idx].is_none() {
            let mut buf = Box::new([0u8; PAGE_SIZE]);
            let on_disk_pages = self.file_length / PAGE_SIZE as u64;
            if (page_num as u64) < on_disk_pages {
                trace!(page_num, "reading page from disk");
                self.file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
                let mut read = 0usize;
                while read < PAGE_SIZE {
                    let n = self.file.read(&mut buf[read..])?;
                    if n == 0 {
                        break;
                    }
                    read += n;
                }
            } else {
                debug!(page_num, "materializing fresh zeroed page");
            }
            self.pages[idx] = Some(buf);
            if page_num >= self.num_pages {
                self.num_pages = page_num + 1;
            }
        }

        Ok(self.pages[idx].as_mut().unwrap().as_mut())
    }

    /// Naive allocator: returns the current page count and never recycles.
    pub fn unused_page_num(&self) -> u32 {
        self.num_pages
    }

    pub fn flush(&mut self, page_num: u32) -> Result<(), Error> {
        let idx = page_num as usize;
        let page = self.pages[idx]
            .as_ref()
            .ok_or_else(|| err!(Corrupt, "attempted to flush an unmaterialized page {}", page_num))?;

        debug!(page_num, "flushing page to disk");
        self.file.seek(SeekFrom::Start(page_num as u64 * PAGE_SIZE as u64))?;
        self.file.write_all(page.as_ref())?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), Error> {
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn get_page_materializes_zeroed_pages_beyond_eof() {
        let file = NamedTempFile::new().unwrap();
        let mut pager = Pager::open(file.path()).unwrap();
        let page = pager.get_page(0).unwrap();
        assert_eq!(page, &[0u8; PAGE_SIZE]);
        assert_eq!(pager.num_pages, 1);
    }

    #[test]
    fn open_rejects_a_file_whose_length_is_not_a_page_multiple() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), vec![0u8; PAGE_SIZE + 1]).unwrap();
        assert!(matches!(Pager::open(file.path()), Err(Error::Corrupt(_))));
    }

    #[test]
    fn flush_then_reopen_round_trips_bytes() {
        let file = NamedTempFile::new().unwrap();
        {
            let mut pager = Pager::open(file.path()).unwrap();
            let page = pager.get_page(0).unwrap();
            page[0] = 42;
            pager.flush(0).unwrap();
            pager.close().unwrap();
        }

        let mut pager = Pager::open(file.path()).unwrap();
        let page = pager.get_page(0).unwrap();
        assert_eq!(page[0], 42);
    }
}
