use alhadi_upload::{ChunkPart, ChunkProgress, ChunkStore};
use bytes::Bytes;
use rand::seq::SliceRandom;

fn split(data: &[u8], chunk_size: usize) -> Vec<Bytes> {
    data.chunks(chunk_size)
        .map(Bytes::copy_from_slice)
        .collect()
}

#[test]
fn test_any_arrival_order_reassembles_original() {
    let original: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
    let chunks = split(&original, 977);
    let total = chunks.len();
    let mut rng = rand::rng();

    for round in 0..25 {
        let store = ChunkStore::new(1024 * 1024);
        let upload_id = format!("upload-{round}");
        let mut order: Vec<usize> = (0..total).collect();
        order.shuffle(&mut rng);

        let mut assembled = None;
        for (position, &index) in order.iter().enumerate() {
            let progress = store
                .accept(ChunkPart {
                    upload_id: upload_id.clone(),
                    index,
                    total,
                    file_name: "lecture.mp4".to_string(),
                    content_type: Some("video/mp4".to_string()),
                    data: chunks[index].clone(),
                })
                .unwrap();

            match progress {
                ChunkProgress::Pending { received, .. } => {
                    assert_eq!(received, position + 1);
                    assert!(position + 1 < total);
                }
                ChunkProgress::Complete(file) => {
                    assert_eq!(position + 1, total);
                    assembled = Some(file);
                }
            }
        }

        let file = assembled.expect("all chunks delivered");
        assert_eq!(&file.data[..], &original[..]);
        assert!(store.is_empty());
    }
}

#[test]
fn test_interleaved_uploads_do_not_mix() {
    let store = ChunkStore::new(1024);
    let part = |id: &str, index: usize, data: &'static [u8]| ChunkPart {
        upload_id: id.to_string(),
        index,
        total: 2,
        file_name: format!("{id}.mp4"),
        content_type: None,
        data: Bytes::from_static(data),
    };

    store.accept(part("a", 1, b"A2")).unwrap();
    store.accept(part("b", 0, b"B1")).unwrap();
    assert_eq!(store.len(), 2);

    let ChunkProgress::Complete(a) = store.accept(part("a", 0, b"A1")).unwrap() else {
        panic!("upload a should be complete");
    };
    assert_eq!(&a.data[..], b"A1A2");
    assert_eq!(store.len(), 1);

    let ChunkProgress::Complete(b) = store.accept(part("b", 1, b"B2")).unwrap() else {
        panic!("upload b should be complete");
    };
    assert_eq!(&b.data[..], b"B1B2");
    assert!(store.is_empty());
}
