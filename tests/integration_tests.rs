// tests/integration_tests.rs
//
// Integration tests for the public Rust API: resolve -> schedule -> transform.

use cimgres::{EngineConfig, Scheduler, TaskState};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use serde_json::json;
use std::io::Cursor;
use std::time::Duration;

fn create_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn scheduler(threads: usize) -> Scheduler {
    Scheduler::with_config(EngineConfig::default().with_worker_threads(threads)).unwrap()
}

mod sync_path {
    use super::*;

    #[test]
    fn test_resize_to_width_keeps_aspect() {
        let input = encode(&create_test_image(300, 200), ImageFormat::Jpeg);
        let out = cimgres::resize_sync(&input, &json!({ "width": 150, "height": 10 })).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (150, 100));
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_scale_and_percent() {
        let input = encode(&create_test_image(80, 60), ImageFormat::Png);
        let half = cimgres::resize_sync(&input, &json!({ "scale": 0.5 })).unwrap();
        assert_eq!(image::load_from_memory(&half).unwrap().dimensions(), (40, 30));

        let quarter = cimgres::resize_sync(&input, &json!({ "percent": 25 })).unwrap();
        assert_eq!(image::load_from_memory(&quarter).unwrap().dimensions(), (20, 15));
    }

    #[test]
    fn test_format_override() {
        let input = encode(&create_test_image(32, 32), ImageFormat::Png);
        for (token, expected) in [
            ("jpg", ImageFormat::Jpeg),
            ("webp", ImageFormat::WebP),
            ("gif", ImageFormat::Gif),
            ("tiff", ImageFormat::Tiff),
            ("hdr", ImageFormat::Hdr),
        ] {
            let out =
                cimgres::resize_sync(&input, &json!({ "percent": 50, "format": token })).unwrap();
            assert_eq!(image::guess_format(&out).unwrap(), expected, "{token}");
        }
    }
}

mod async_path {
    use super::*;

    #[test]
    fn test_sync_and_async_are_byte_identical() {
        let s = scheduler(2);
        let inputs = [
            (encode(&create_test_image(64, 48), ImageFormat::Png), json!({ "scale": 0.75 })),
            (encode(&create_test_image(64, 48), ImageFormat::Jpeg), json!({ "width": 20, "height": 20 })),
            (encode(&create_test_image(30, 30), ImageFormat::Png), json!({ "percent": 200, "format": "webp" })),
        ];
        for (input, options) in inputs {
            let sync = s.run_sync(&input, &options).unwrap();
            let deferred = s.submit(input, &options).unwrap();
            assert_eq!(deferred.wait().unwrap(), sync, "{options}");
        }
    }

    #[test]
    fn test_concurrent_requests_are_isolated() {
        let s = scheduler(4);
        let requests: Vec<(u32, Vec<u8>)> = (1..=16u32)
            .map(|i| (i, encode(&create_test_image(10 + i, 10 + 2 * i), ImageFormat::Png)))
            .collect();

        let handles: Vec<_> = requests
            .iter()
            .map(|(i, input)| {
                let deferred = s
                    .submit(input.as_slice(), &json!({ "percent": 100 * (i % 3 + 1) }))
                    .unwrap();
                (*i, deferred)
            })
            .collect();

        for (i, deferred) in handles {
            let factor = i % 3 + 1;
            let out = deferred.wait().unwrap();
            let img = image::load_from_memory(&out).unwrap();
            assert_eq!(img.dimensions(), ((10 + i) * factor, (10 + 2 * i) * factor), "request {i}");
        }
    }

    #[test]
    fn test_handle_reaches_terminal_state() {
        let s = scheduler(1);
        let input = encode(&create_test_image(16, 16), ImageFormat::Png);
        let deferred = s.submit(input, &json!({ "percent": 50 })).unwrap();
        let result = deferred
            .wait_timeout(Duration::from_secs(30))
            .unwrap_or_else(|pending| panic!("still {:?}", pending.state()));
        assert!(result.is_ok());
    }

    #[test]
    fn test_deferred_is_a_future() {
        // Drive the future with a thread-parking waker; no runtime needed
        use std::future::Future;
        use std::pin::pin;
        use std::sync::Arc;
        use std::task::{Context, Poll, Wake, Waker};
        use std::thread::{self, Thread};

        struct ThreadWaker(Thread);
        impl Wake for ThreadWaker {
            fn wake(self: Arc<Self>) {
                self.0.unpark();
            }
        }

        let s = scheduler(1);
        let input = encode(&create_test_image(20, 20), ImageFormat::Png);
        let mut fut = pin!(s.submit(input, &json!({ "scale": 0.5 })).unwrap());
        let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
        let mut cx = Context::from_waker(&waker);
        let out = loop {
            match fut.as_mut().poll(&mut cx) {
                Poll::Ready(result) => break result.unwrap(),
                Poll::Pending => thread::park_timeout(Duration::from_millis(50)),
            }
        };
        assert_eq!(image::load_from_memory(&out).unwrap().dimensions(), (10, 10));
    }

    #[test]
    fn test_global_async_entry_point() {
        let input = encode(&create_test_image(40, 40), ImageFormat::Png);
        let deferred = cimgres::resize(input, &json!({ "percent": 10 })).unwrap();
        assert_ne!(deferred.state(), TaskState::Failed);
        let out = deferred.wait().unwrap();
        assert_eq!(image::load_from_memory(&out).unwrap().dimensions(), (4, 4));
    }
}
