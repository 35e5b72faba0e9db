use arbitrary::{unstructured::Unstructured, Arbitrary};
use rand::{prelude::random, rngs::SmallRng, Rng, SeedableRng};
use structopt::StructOpt;

use std::{ops::Bound, time};

use ubst::{Config, Index, Natural, Query, Traversal};

/// Command line options.
#[derive(Clone, StructOpt)]
pub struct Opt {
    #[structopt(long = "seed")]
    seed: Option<u64>,

    #[structopt(long = "unique")]
    unique: bool,

    #[structopt(long = "no-recycle")]
    no_recycle: bool,

    #[structopt(long = "recursion-limit", default_value = "100000")]
    recursion_limit: usize,

    #[structopt(long = "depth-limit", default_value = "1000")]
    depth_limit: usize,

    #[structopt(long = "keys", default_value = "1000000")] // key space
    keys: u64,

    #[structopt(long = "loads", default_value = "1000000")] // default 1M
    loads: usize,

    #[structopt(long = "sets", default_value = "0")]
    sets: usize,

    #[structopt(long = "dels", default_value = "0")]
    dels: usize,

    #[structopt(long = "gets", default_value = "0")]
    gets: usize,

    #[structopt(long = "ranges", default_value = "0")]
    ranges: usize,
}

fn main() {
    let opts = Opt::from_args();
    let seed = opts.seed.unwrap_or_else(random);
    println!("seed {}", seed);
    let mut rng = SmallRng::seed_from_u64(seed);

    let config = Config::new()
        .set_unique(opts.unique)
        .set_recycle(!opts.no_recycle)
        .set_recursion_limit(opts.recursion_limit)
        .set_depth_limit(opts.depth_limit)
        .set_seed(seed);
    let mut index: Index<u64, u64> = Index::with_config(config, Natural);

    // initial load
    let start = time::Instant::now();
    for _i in 0..opts.loads {
        let (key, val): (u64, u64) = (rng.gen::<u64>() % opts.keys, rng.gen());
        index.insert(key, val).ok();
    }
    println!(
        "loaded {} items, {} keys in {:?}",
        opts.loads,
        index.len(),
        start.elapsed()
    );

    do_incremental(&mut rng, &opts, &mut index);
    do_ranges(&mut rng, &opts, &index);

    let start = time::Instant::now();
    let n = index.iter().count();
    println!("iter for iterating {}, took {:?}", n, start.elapsed());

    println!("stats {:?}", index.stats());
}

fn do_incremental(rng: &mut SmallRng, opts: &Opt, index: &mut Index<u64, u64>) {
    let total = opts.sets + opts.dels + opts.gets;
    if total == 0 {
        return;
    }

    let start = time::Instant::now();
    let mut n = total;
    while n > 0 {
        let op = rng.gen::<usize>() % total;

        let key = rng.gen::<u64>() % opts.keys;
        if op < opts.sets {
            let val = rng.gen::<u64>();
            index.insert(key, val).ok();
        } else if op < (opts.sets + opts.dels) {
            index.delete(&key, None).ok();
        } else {
            index.get(&key).ok();
        }
        n -= 1;
    }
    println!(
        "incremental for operations {}, took {:?}",
        total,
        start.elapsed()
    );
}

fn do_ranges(rng: &mut SmallRng, opts: &Opt, index: &Index<u64, u64>) {
    if opts.ranges == 0 {
        return;
    }

    for traversal in [Traversal::Recursive, Traversal::Worklist].iter() {
        let mut rng = SmallRng::seed_from_u64(rng.gen());
        let start = time::Instant::now();
        let mut n_values = 0;
        for _i in 0..opts.ranges {
            let bytes = rng.gen::<[u8; 32]>();
            let mut uns = Unstructured::new(&bytes);
            let (l, h): (Limit<u64>, Limit<u64>) = match uns.arbitrary() {
                Ok(limits) => limits,
                Err(_) => continue,
            };
            let query: Query<u64> = (l.into_bound(opts.keys), h.into_bound(opts.keys)).into();
            index
                .query_by(*traversal, &query, |_| {
                    n_values += 1;
                    true
                })
                .ok();
        }
        println!(
            "ranges-{:?} for {} queries {} values, took {:?}",
            traversal,
            opts.ranges,
            n_values,
            start.elapsed()
        );
    }
}

#[derive(Clone, Debug, Arbitrary, Eq, PartialEq)]
enum Limit<T> {
    Unbounded,
    Included(T),
    Excluded(T),
}

impl Limit<u64> {
    fn into_bound(self, keys: u64) -> Bound<u64> {
        match self {
            Limit::Unbounded => Bound::Unbounded,
            Limit::Included(v) => Bound::Included(v % keys),
            Limit::Excluded(v) => Bound::Excluded(v % keys),
        }
    }
}
