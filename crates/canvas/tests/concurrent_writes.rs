//! Concurrent writers sharing one canvas through the in-memory store.

use std::sync::Arc;
use std::thread;

use canvas::{decode_fields, CanvasConfig, CanvasStore, MemoryStore, ResetStrategy};

const WIDTH: u32 = 16;
const HEIGHT: u32 = 16;

fn shared_canvas(strategy: ResetStrategy) -> CanvasStore {
    let mut config = CanvasConfig::new(WIDTH, HEIGHT, 4);
    config.reset_strategy = strategy;
    CanvasStore::new(config, Arc::new(MemoryStore::new())).unwrap()
}

fn all_cells(canvas: &CanvasStore) -> Vec<u16> {
    decode_fields(&canvas.get_all().unwrap(), 4, (WIDTH * HEIGHT) as usize)
}

#[test]
fn test_neighbouring_nibbles_never_clobber_each_other() {
    let canvas = shared_canvas(ResetStrategy::PerField);

    // Each thread owns one column. Columns 2k and 2k+1 share every byte, so a
    // non-atomic read-modify-write would lose updates.
    let handles: Vec<_> = (0..WIDTH)
        .map(|x| {
            let canvas = canvas.clone();
            thread::spawn(move || {
                for round in 0..20 {
                    for y in 0..HEIGHT {
                        let value = (x + y + round) % 16;
                        canvas
                            .set_pixel(i64::from(x), i64::from(y), i64::from(value))
                            .unwrap();
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let cells = all_cells(&canvas);
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            let expected = (x + y + 19) % 16;
            assert_eq!(u32::from(cells[(y * WIDTH + x) as usize]), expected, "cell ({x}, {y})");
        }
    }
}

#[test]
fn test_reset_racing_writers_leaves_a_complete_canvas() {
    for strategy in [ResetStrategy::PerField, ResetStrategy::Bulk] {
        let canvas = shared_canvas(strategy);

        let writer = {
            let canvas = canvas.clone();
            thread::spawn(move || {
                for i in 0..500u32 {
                    let x = i % WIDTH;
                    let y = (i / WIDTH) % HEIGHT;
                    canvas.set_pixel(i64::from(x), i64::from(y), 15).unwrap();
                }
            })
        };
        let resetter = {
            let canvas = canvas.clone();
            thread::spawn(move || {
                for _ in 0..3 {
                    canvas.reset().unwrap();
                }
            })
        };

        writer.join().unwrap();
        resetter.join().unwrap();

        // Whatever interleaving happened, every cell holds a valid value and
        // the buffer covers the whole canvas.
        let bytes = canvas.get_all().unwrap();
        assert_eq!(bytes.len(), (WIDTH * HEIGHT / 2) as usize);
        assert!(all_cells(&canvas).iter().all(|v| *v <= 15));
    }
}
