//! Basic example of `SegmentedDeque` as a double-ended work queue.

use segmented_deque::SegmentedDeque;

fn main() {
    let mut queue = SegmentedDeque::new();

    // Regular work arrives at the back...
    for job in 1..=5 {
        queue.push_back(format!("job-{job}"));
    }

    // ...urgent work jumps the line at the front.
    queue.push_front("job-URGENT".to_string());

    println!("queue of {} jobs across {} buffers", queue.len(), queue.buffer_count());
    println!("third in line: {}", queue[2]);

    while let Some(job) = queue.pop_front() {
        println!("processing {job}");
    }

    // Emptied, the deque keeps one buffer so the next burst of pushes
    // does not need the allocator.
    assert!(queue.is_empty());
    assert_eq!(queue.buffer_count(), 1);
}
