//! Basic example of the set- and map-flavored uses of `OrderedTree`.

use ordered_tree::{MapTree, OrderedTree};

fn main() {
    // Set flavor: the value is the key.
    let mut primes = OrderedTree::<u32>::new();
    for p in [13, 2, 7, 3, 11, 5] {
        primes.insert_unique(p).unwrap();
    }

    println!("primes in order: {primes:?}");

    if let Err((existing, rejected)) = primes.insert_unique(7) {
        println!(
            "{rejected} was refused; {} already sits at {existing:?}",
            primes.get(existing)
        );
    }

    // Map flavor: (key, mapped) pairs ordered by key.
    let mut capitals = MapTree::<&str, &str>::new();
    capitals.insert_unique(("France", "Paris")).unwrap();
    capitals.insert_unique(("Japan", "Tokyo")).unwrap();
    capitals.insert_unique(("Brazil", "Brasilia")).unwrap();

    let id = capitals.find(&"Japan").unwrap();
    println!("capital of Japan: {}", capitals.get(id).1);

    // Ordered navigation: the first country at or after "G".
    let id = capitals.lower_bound(&"G").unwrap();
    println!("first country from G on: {}", capitals.get(id).0);
}
