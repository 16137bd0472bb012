//! Tests for greedy assignment: usage balancing, neighbour diversity and fallback

#[cfg(test)]
mod tests {
    use tilemosaic::algorithm::assignment::{AssignmentEngine, AssignmentOptions};
    use tilemosaic::analysis::cells::SourceCell;
    use tilemosaic::color::distance::{ColorSample, DistanceMetric};
    use tilemosaic::color::lab::rgb_to_lab;

    const RED: [u8; 3] = [255, 0, 0];
    const GREEN: [u8; 3] = [0, 255, 0];
    const BLUE: [u8; 3] = [0, 0, 255];
    const WHITE: [u8; 3] = [255, 255, 255];

    fn sample(rgb: [u8; 3]) -> ColorSample {
        ColorSample {
            rgb,
            lab: rgb_to_lab(rgb),
        }
    }

    fn cells(grid_size: u32, color_at: impl Fn(u32, u32) -> [u8; 3]) -> Vec<SourceCell> {
        (0..grid_size)
            .flat_map(|y| (0..grid_size).map(move |x| (x, y)))
            .map(|(x, y)| {
                let rgb = color_at(x, y);
                SourceCell {
                    x,
                    y,
                    rgb,
                    lab: rgb_to_lab(rgb),
                }
            })
            .collect()
    }

    fn options(metric: DistanceMetric, neighbor_diversity: bool) -> AssignmentOptions {
        AssignmentOptions {
            metric,
            neighbor_diversity,
            ..AssignmentOptions::default()
        }
    }

    fn gradient(x: u32, y: u32) -> [u8; 3] {
        [(x * 40) as u8, (y * 40) as u8, ((x + y) * 20) as u8]
    }

    // Verifies every cell is placed once and usage sums to the cell count
    // Verified by skipping the usage increment on the last cell
    #[test]
    fn test_assignment_places_every_cell() {
        let tiles: Vec<ColorSample> = [RED, GREEN, BLUE, WHITE, [0, 0, 0]]
            .into_iter()
            .map(sample)
            .collect();
        let source = cells(6, gradient);

        let engine = AssignmentEngine::new(&tiles, 6, options(DistanceMetric::Cie76, true))
            .expect("engine should build");
        let mut reported = 0;
        let assignment = engine
            .run(&source, |done, _| {
                reported = done;
                Ok(())
            })
            .expect("assignment should succeed");

        assert!(assignment.placements.is_complete());
        assert_eq!(assignment.usage.total(), 36);
        assert_eq!(reported, 36);
    }

    // Verifies no two orthogonal neighbours share a tile when the pool has five or more
    // Verified by skipping the neighbour exclusion
    #[test]
    fn test_neighbor_diversity() {
        let tiles: Vec<ColorSample> = (0..5u8).map(|i| sample([i * 10, i * 10, i * 10])).collect();
        // A flat source would otherwise pick the same nearest tile everywhere
        let source = cells(8, |_, _| [0, 0, 0]);

        let engine = AssignmentEngine::new(&tiles, 8, options(DistanceMetric::Cie76, true))
            .expect("engine should build");
        let assignment = engine.run(&source, |_, _| Ok(())).expect("assignment");

        let map = &assignment.placements;
        for y in 0..8 {
            for x in 0..8 {
                let slot = map.get(x, y);
                if x + 1 < 8 {
                    assert_ne!(slot, map.get(x + 1, y), "horizontal repeat at ({x}, {y})");
                }
                if y + 1 < 8 {
                    assert_ne!(slot, map.get(x, y + 1), "vertical repeat at ({x}, {y})");
                }
            }
        }
        assert_eq!(assignment.stats.fallbacks, 0);
    }

    // Without diversity, usage balancing alone alternates tiles so columns repeat
    #[test]
    fn test_diversity_disabled_allows_repeats() {
        let tiles: Vec<ColorSample> = [RED, BLUE].into_iter().map(sample).collect();
        let source = cells(2, |_, _| RED);

        let engine = AssignmentEngine::new(&tiles, 2, options(DistanceMetric::WeightedRgb, false))
            .expect("engine should build");
        assert_eq!(engine.ceiling(), 3);
        let assignment = engine.run(&source, |_, _| Ok(())).expect("assignment");

        assert_eq!(assignment.usage.as_slice(), &[2, 2]);
        assert_eq!(assignment.placements.get(0, 0), Some(0));
        assert_eq!(assignment.placements.get(0, 1), Some(0));
        assert_eq!(assignment.stats.fallbacks, 0);
    }

    // A lone cell takes the nearest tile and never touches the ceiling
    #[test]
    fn test_single_cell_picks_nearest() {
        let tiles: Vec<ColorSample> = [RED, BLUE].into_iter().map(sample).collect();
        let source = cells(1, |_, _| RED);

        let engine = AssignmentEngine::new(&tiles, 1, options(DistanceMetric::WeightedRgb, false))
            .expect("engine should build");
        assert_eq!(engine.ceiling(), 2);
        let assignment = engine.run(&source, |_, _| Ok(())).expect("assignment");

        assert_eq!(assignment.usage.as_slice(), &[1, 0]);
        assert_eq!(assignment.stats.saturated_cells, 0);
    }

    // Verifies a single-tile pool falls back on every cell with a placed neighbour
    // Verified by counting fallbacks when the exclusion set is empty
    #[test]
    fn test_single_tile_fallback() {
        let tiles = vec![sample(RED)];
        let source = cells(3, gradient);

        let engine = AssignmentEngine::new(&tiles, 3, options(DistanceMetric::Cie76, true))
            .expect("engine should build");
        let assignment = engine.run(&source, |_, _| Ok(())).expect("assignment");

        assert_eq!(assignment.stats.fallbacks, 8);
        assert_eq!(assignment.usage.as_slice(), &[9]);
    }

    // Two tiles form a checkerboard without ever relaxing the constraint
    #[test]
    fn test_two_tiles_checkerboard() {
        let tiles: Vec<ColorSample> = [RED, BLUE].into_iter().map(sample).collect();
        let source = cells(4, |_, _| RED);

        let engine = AssignmentEngine::new(&tiles, 4, options(DistanceMetric::Cie76, true))
            .expect("engine should build");
        let assignment = engine.run(&source, |_, _| Ok(())).expect("assignment");

        assert_eq!(assignment.stats.fallbacks, 0);
        for y in 0..4 {
            for x in 0..4 {
                let expected = (x + y) % 2;
                assert_eq!(assignment.placements.get(x, y), Some(expected));
            }
        }
    }

    // Verifies the 2×2 color blocks of the source get four distinct tiles used equally
    #[test]
    fn test_four_color_blocks() {
        let tiles: Vec<ColorSample> = [RED, GREEN, BLUE, WHITE].into_iter().map(sample).collect();
        let source = cells(4, |x, y| match (x % 2, y % 2) {
            (0, 0) => RED,
            (1, 0) => GREEN,
            (0, _) => BLUE,
            _ => WHITE,
        });

        let engine = AssignmentEngine::new(&tiles, 4, options(DistanceMetric::WeightedRgb, true))
            .expect("engine should build");
        let assignment = engine.run(&source, |_, _| Ok(())).expect("assignment");

        assert_eq!(assignment.usage.as_slice(), &[4, 4, 4, 4]);
        let map = &assignment.placements;
        for (bx, by) in [(0, 0), (2, 0), (0, 2), (2, 2)] {
            let mut block = vec![
                map.get(bx, by),
                map.get(bx + 1, by),
                map.get(bx, by + 1),
                map.get(bx + 1, by + 1),
            ];
            block.sort_unstable();
            block.dedup();
            assert_eq!(block.len(), 4, "block at ({bx}, {by}) repeats a tile");
        }

        let rows: Vec<Vec<Option<usize>>> = (0..4)
            .map(|y| (0..4).map(|x| map.get(x, y)).collect())
            .collect();
        let (r, g, b, w) = (Some(0), Some(1), Some(2), Some(3));
        assert_eq!(rows[0], vec![r, g, b, w]);
        assert_eq!(rows[1], vec![b, w, r, g]);
    }

    // Same seed, same result
    #[test]
    fn test_assignment_reproducible() {
        let tiles: Vec<ColorSample> = (0..30u8).map(|i| sample([i * 8, 255 - i * 8, i * 4])).collect();
        let source = cells(10, gradient);

        let run = || {
            AssignmentEngine::new(&tiles, 10, options(DistanceMetric::Cie76, true))
                .expect("engine should build")
                .run(&source, |_, _| Ok(()))
                .expect("assignment")
        };
        let first = run();
        let second = run();

        let slots = |a: &tilemosaic::algorithm::assignment::Assignment| -> Vec<Option<usize>> {
            a.placements.iter_row_major().map(|(_, _, slot)| slot).collect()
        };
        assert_eq!(slots(&first), slots(&second));
    }

    #[test]
    fn test_engine_rejects_empty_pool() {
        assert!(AssignmentEngine::new(&[], 4, AssignmentOptions::default()).is_err());
        let tiles = [sample(RED)];
        assert!(AssignmentEngine::new(&tiles, 0, AssignmentOptions::default()).is_err());
    }

    // Cell count must match the grid
    #[test]
    fn test_run_rejects_wrong_cell_count() {
        let tiles = [sample(RED)];
        let engine = AssignmentEngine::new(&tiles, 3, AssignmentOptions::default())
            .expect("engine should build");
        assert!(engine.run(&cells(2, gradient), |_, _| Ok(())).is_err());
    }

    // An error from the callback stops the run
    #[test]
    fn test_run_stops_on_callback_error() {
        let tiles = [sample(RED), sample(BLUE)];
        let engine = AssignmentEngine::new(&tiles, 3, AssignmentOptions::default())
            .expect("engine should build");
        let mut calls = 0;
        let result = engine.run(&cells(3, gradient), |done, _| {
            calls += 1;
            if done == 4 {
                Err(tilemosaic::MosaicError::Cancelled)
            } else {
                Ok(())
            }
        });

        assert!(matches!(result, Err(tilemosaic::MosaicError::Cancelled)));
        assert_eq!(calls, 4);
    }

    // Incremental use: cells assigned one by one
    #[test]
    fn test_assign_cell_incremental() {
        let tiles = [sample(RED), sample(BLUE)];
        let mut engine = AssignmentEngine::new(&tiles, 2, AssignmentOptions::default())
            .expect("engine should build");
        let source = cells(2, |_, _| BLUE);

        assert_eq!(engine.assign_cell(&source[0]).ok(), Some(1));
        assert_eq!(engine.placements().placed_count(), 1);
        assert_eq!(engine.usage().get(1), 1);
        assert!(engine.stats().total_distance.abs() < 1e-9);
        assert!(engine.assign_cell(&source[0]).is_err());
    }
}
