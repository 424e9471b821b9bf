use crate::{ColfsError, ColfsResult, LocalBlockRef};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::io::Cursor;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

/// Stream of block bytes handed back by a read. Backed by a memory mapping
/// for local blocks and by whatever the store client streams for remote ones.
pub type BlockReader = Pin<Box<dyn AsyncRead + Unpin + Send>>;

/// Open the zero-copy read path over a block the store claims is resident on
/// this node. The claimed byte range is mapped read-only; the mapping and the
/// file handle are released when the returned reader is dropped.
///
/// The store vouched for local residency, so a missing or unmappable file is
/// a fatal local error, never a silent fallback to remote.
pub(crate) fn open_local_block(local: &LocalBlockRef) -> ColfsResult<BlockReader> {
    if local.file.is_empty() {
        return Err(ColfsError::LocalBlockError(
            "local file name is not defined".to_string(),
        ));
    }

    // A zero-length block has nothing to map.
    if local.length == 0 {
        return Ok(Box::pin(Cursor::new(Vec::new())));
    }

    let file = File::open(&local.file).map_err(|e| {
        warn!("BlockRead: open local block file failed! {}", e);
        ColfsError::LocalBlockError(format!("local file does not exist: {}: {}", local.file, e))
    })?;

    info!("BlockRead: mapping {} bytes of {}", local.length, local.file);

    // Safety: the mapping is read-only and private to the returned reader.
    let map = unsafe {
        MmapOptions::new()
            .offset(local.offset)
            .len(local.length as usize)
            .map(&file)
    }
    .map_err(|e| {
        warn!("BlockRead: map local block failed! {}", e);
        ColfsError::LocalBlockError(format!(
            "unable to map block {}[{},{}]: {}",
            local.file, local.length, local.offset, e
        ))
    })?;

    Ok(Box::pin(MappedBlockReader { map, pos: 0 }))
}

/// AsyncRead view over a mapped region. Reads always complete immediately,
/// the bytes are already resident.
struct MappedBlockReader {
    map: Mmap,
    pos: usize,
}

impl AsyncRead for MappedBlockReader {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let reader = self.get_mut();
        let remaining = reader.map.len() - reader.pos;
        if remaining == 0 {
            return Poll::Ready(Ok(()));
        }

        let max_to_read = buf.remaining().min(remaining);
        if max_to_read == 0 {
            return Poll::Ready(Ok(()));
        }

        buf.put_slice(&reader.map[reader.pos..reader.pos + max_to_read]);
        reader.pos += max_to_read;
        Poll::Ready(Ok(()))
    }
}
