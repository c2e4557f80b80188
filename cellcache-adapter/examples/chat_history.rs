use std::cell::RefCell;
use std::rc::Rc;

use cellcache::{Position, RenderedRange, ResizedNode};
use cellcache_adapter::{
    BoxError, InfiniteScroll, Scroller, ScrollerOptions, VirtualizationEngine,
};

/// Stand-in for a real grid engine: prints what it is asked to do.
#[derive(Debug, Default)]
struct PrintingEngine;

impl VirtualizationEngine for PrintingEngine {
    fn recompute_layout(&mut self, from: Option<Position>) {
        match from {
            Some(p) => println!("  engine: recompute from row {}", p.row),
            None => println!("  engine: recompute everything"),
        }
    }

    fn scroll_to_index(&mut self, index: usize) {
        println!("  engine: scroll to slot {index}");
    }
}

fn main() {
    // Example: a chat history that loads older messages when the user scrolls to the top.
    //
    // The adapter flow is typically:
    // 1) push the key order with `sync_items` (oldest first; the loader slot sits on top)
    // 2) feed measurements and engine range reports after each render pass
    // 3) start loads on sentinel visibility, poll them, then push the grown key order
    let history: Rc<RefCell<Vec<u32>>> = Rc::new(RefCell::new((90..100).collect()));

    let source = Rc::clone(&history);
    let infinite = InfiniteScroll::new(true, move || {
        let source = Rc::clone(&source);
        async move {
            let mut h = source.borrow_mut();
            let oldest = h.first().copied().unwrap_or(0);
            let page: Vec<u32> = (oldest.saturating_sub(10)..oldest).collect();
            h.splice(0..0, page);
            Ok::<(), BoxError>(())
        }
    })
    .with_scroll_reverse(true);

    let mut scroller = Scroller::<u32, _>::new(
        PrintingEngine,
        ScrollerOptions::default().with_infinite_scroll(infinite),
    )
    .expect("valid options");

    println!("mount");
    scroller.sync_items(history.borrow().iter().copied());
    for slot in 1..scroller.slot_count() {
        scroller.measure(slot, 320.0, 24.0 + (slot % 3) as f32 * 8.0);
    }
    scroller.on_range_rendered(RenderedRange {
        start_index: 0,
        stop_index: 4,
        overscan_start_index: 0,
        overscan_stop_index: 10,
    });
    scroller.on_resize((91..95).map(ResizedNode::attached));

    println!("sentinel visible");
    if let Some(task) = scroller.on_sentinel_visibility(true) {
        futures::executor::block_on(task).expect("page loaded");
    }
    println!("older page arrived");
    scroller.sync_items(history.borrow().iter().copied());
    println!(
        "slots={} loader={:?} row 11 height={}",
        scroller.slot_count(),
        scroller.loader_state(),
        scroller.row_height(11)
    );

    println!("an image in message 92 finished loading");
    scroller.on_resize([ResizedNode::attached(92)]);
    let rearmed = scroller.on_frame(16);
    println!("row of 92 now reports {} until re-measured", scroller.row_height(13));

    if let Some(task) = rearmed {
        println!("sentinel still on screen: loading another page");
        futures::executor::block_on(task).expect("page loaded");
        scroller.sync_items(history.borrow().iter().copied());
    }
    println!("slots={}", scroller.slot_count());
}
