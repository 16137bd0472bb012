//! Tests for engine events and sinks

#[cfg(test)]
mod tests {
    use image::RgbaImage;
    use std::sync::mpsc;
    use tilemosaic::MosaicError;
    use tilemosaic::analysis::extraction::{TileFailure, TileId};
    use tilemosaic::io::events::{EngineEvent, EventSink, FnSink, PreviewFrame};

    fn failure() -> EngineEvent {
        EngineEvent::TileFailed(TileFailure {
            tile_id: TileId(1),
            filename: "a.png".to_string(),
            reason: "broken".to_string(),
        })
    }

    #[test]
    fn test_terminal_events() {
        assert!(EngineEvent::Cancelled.is_terminal());
        assert!(EngineEvent::Failed(MosaicError::Cancelled).is_terminal());
        assert!(!failure().is_terminal());
        let preview = EngineEvent::Preview(PreviewFrame {
            grid_size: 2,
            cells_done: 1,
            raster: RgbaImage::new(2, 2),
        });
        assert!(!preview.is_terminal());
    }

    // Verifies each sink delivers events in order
    #[test]
    fn test_sinks() {
        let mut events = Vec::new();
        events.emit(failure());
        events.emit(EngineEvent::Cancelled);
        assert!(matches!(events.as_slice(), [EngineEvent::TileFailed(_), EngineEvent::Cancelled]));

        let mut count = 0;
        let mut sink = FnSink(|event: EngineEvent| {
            if event.is_terminal() {
                count += 10;
            } else {
                count += 1;
            }
        });
        sink.emit(failure());
        sink.emit(EngineEvent::Cancelled);
        drop(sink);
        assert_eq!(count, 11);
    }

    // A sender keeps working after its receiver is gone
    #[test]
    fn test_sender_sink() {
        let (mut sender, receiver) = mpsc::channel();
        sender.emit(EngineEvent::Cancelled);
        assert!(matches!(receiver.recv(), Ok(EngineEvent::Cancelled)));

        drop(receiver);
        sender.emit(failure());
    }
}
