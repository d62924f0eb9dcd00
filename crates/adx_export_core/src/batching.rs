use crate::contract::ValidationError;

/// Splits `items` into consecutive chunks of at most `batch_size` entries,
/// preserving order. An empty input yields no chunks.
pub fn chunk_assets<T: Clone>(
    items: &[T],
    batch_size: usize,
) -> Result<Vec<Vec<T>>, ValidationError> {
    if batch_size == 0 {
        return Err(ValidationError::new("batch size must be a positive integer"));
    }

    let chunks: Vec<Vec<T>> = items.chunks(batch_size).map(<[T]>::to_vec).collect();
    validate_chunks(items.len(), batch_size, &chunks)?;
    Ok(chunks)
}

pub fn expected_chunk_count(total_items: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    total_items.div_ceil(batch_size)
}

fn validate_chunks<T>(
    total_items: usize,
    batch_size: usize,
    chunks: &[Vec<T>],
) -> Result<(), ValidationError> {
    if chunks.len() != expected_chunk_count(total_items, batch_size) {
        return Err(ValidationError::new(format!(
            "expected {} chunks for {total_items} items, produced {}",
            expected_chunk_count(total_items, batch_size),
            chunks.len()
        )));
    }

    if chunks.iter().any(|chunk| chunk.is_empty() || chunk.len() > batch_size) {
        return Err(ValidationError::new(format!(
            "chunk sizes must be within 1..={batch_size}"
        )));
    }

    let covered: usize = chunks.iter().map(Vec::len).sum();
    if covered != total_items {
        return Err(ValidationError::new(
            "chunks do not cover every item exactly once",
        ));
    }

    Ok(())
}
