use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use e6f_common::post::{
    extension::Extension,
    rating::Rating,
    tags::{PostTags, TagCategory},
    FileInfo, PostData,
};
use e6f_filter::{filter::FilterBuiltins, registry::FilterRegistry};
use rand::{seq::SliceRandom, thread_rng, Rng};

const TAGS: [&str; 27] = [
    "dog",
    "cat",
    "anthro",
    "gore",
    "male",
    "female",
    "skadi_(arknights)",
    "colored_nails",
    "claws",
    "abs",
    "shirt",
    "sex",
    "tall",
    "abstract",
    "pokemon",
    "human",
    "wolf",
    "fox",
    "cervid",
    "deer",
    "whale",
    "helicopter",
    "sword",
    "gun",
    "blood",
    "painting",
    "breasts",
];

const EXTENSIONS: [Extension; 5] = [
    Extension::WEBM,
    Extension::JPG,
    Extension::PNG,
    Extension::WEBP,
    Extension::GIF,
];

const RATINGS: [Rating; 3] = [Rating::Safe, Rating::Questionable, Rating::Explicit];

const LINES: [&str; 8] = [
    "gore",
    "-solo score:>50",
    "rating:e filesize:>5mb",
    "~wolf ~fox anthro",
    "blood -painting",
    "type:webm duration:>30",
    "tagcount:<3",
    "*_(arknights) rating:q",
];

fn seed_posts(num: u64) -> Vec<PostData> {
    let mut rng = thread_rng();

    (0..num)
        .map(|id| {
            let rn = rng.gen_range(0..=27);
            let tags: Vec<&str> = TAGS.choose_multiple(&mut rng, rn).copied().collect();

            PostData {
                id,
                rating: *RATINGS.choose(&mut rng).unwrap(),
                score: rng.gen_range(-20..200),
                favorites: rng.gen_range(0..500),
                tags: PostTags::from_categories([(TagCategory::General, tags)]),
                file: FileInfo {
                    extension: *EXTENSIONS.choose(&mut rng).unwrap(),
                    width: rng.gen_range(100..4000),
                    height: rng.gen_range(100..4000),
                    size: rng.gen_range(10_000..20_000_000),
                    duration: rng.gen_bool(0.2).then(|| rng.gen_range(1.0..120.0)),
                },
                ..Default::default()
            }
        })
        .collect()
}

fn registry() -> FilterRegistry {
    let mut registry = FilterRegistry::new();
    registry.load(LINES, true, &FilterBuiltins::default());
    registry
}

fn post_filter_bench(c: &mut Criterion) {
    for num in [20, 100, 1000, 10000] {
        c.bench_function(&format!("Filter {num} Posts"), |b| {
            b.iter_batched(
                || (registry(), seed_posts(num)),
                |(mut registry, posts)| black_box(registry.add_post(&posts)),
                BatchSize::SmallInput,
            )
        });
    }

    c.bench_function("Check 10000 Posts", |b| {
        let posts = seed_posts(10000);
        let mut registry = registry();
        registry.add_post(&posts);

        b.iter(|| {
            posts
                .iter()
                .filter(|post| registry.check_post(*post, false))
                .count()
        })
    });
}

criterion_group!(benches, post_filter_bench);
criterion_main!(benches);
