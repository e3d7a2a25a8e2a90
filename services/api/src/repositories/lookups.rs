//! Enrichment stages shared by the catalog list pipelines

use common::{
    assets::AssetUrl,
    pipeline::{Lookup, Stage, Unwind},
};
use mongodb::bson::{Bson, Document, doc};

pub const BOOKS: &str = "books";
pub const CART_ITEMS: &str = "cart_items";
pub const COURSES: &str = "courses";
pub const FEEDS: &str = "feeds";
pub const MEDIA: &str = "media";
pub const STOCKS: &str = "stocks";

/// Position of a section inside its feed while the feed is unwound
const SECTION_INDEX: &str = "section_index";

/// Stage adding the fetchable `url` of a media document
pub fn hydrate_url(assets: &AssetUrl) -> Stage {
    Stage::AddFields(doc! { "url": assets.expression("path") })
}

/// Join the media document referenced by `local_field` into `as_field`, with its url
pub fn image(assets: &AssetUrl, local_field: &str, as_field: &str) -> Vec<Stage> {
    Stage::join_one(Lookup::by_id(MEDIA, local_field, as_field).then(hydrate_url(assets)))
}

/// Available stocks whose `foreign_field` references the parent, grouped by edition
///
/// Each group is `{_id: {publisher, year}, prices, discount_percents, count}`.
pub fn stock_summary(foreign_field: &str) -> Stage {
    Stage::Lookup(
        Lookup::correlated(STOCKS, "_id", foreign_field, "stocks")
            .then(Stage::Match(doc! { "status": "available" }))
            .then(Stage::Group(doc! {
                "_id": { "publisher": "$publisher", "year": "$year" },
                "prices": { "$push": "$price" },
                "discount_percents": { "$push": "$discount_percent" },
                "count": { "$sum": 1 },
            }))
            .then(Stage::Sort(doc! { "_id.publisher": 1, "_id.year": 1 })),
    )
}

/// Join a course, with its image
pub fn course(assets: &AssetUrl, local_field: &str, as_field: &str) -> Vec<Stage> {
    Stage::join_one(
        Lookup::by_id(COURSES, local_field, as_field).then_all(image(assets, "image", "image")),
    )
}

/// Join a book, with its image and the availability summary of its stocks
pub fn book(assets: &AssetUrl, local_field: &str, as_field: &str) -> Vec<Stage> {
    Stage::join_one(
        Lookup::by_id(BOOKS, local_field, as_field)
            .then_all(image(assets, "image", "image"))
            .then(stock_summary("book_id")),
    )
}

/// Feed scalars carried through the regroup unchanged
const FEED_FIELDS: [&str; 10] = [
    "name",
    "title",
    "type",
    "view_type",
    "linked",
    "paralink",
    "order",
    "created_by",
    "created_on",
    "updated_on",
];

/// Enrich every top level section of a feed and fold the feed back together
///
/// Sections are unwound with their index, joined one by one, and pushed back
/// in their original order. Feeds without sections come out with an empty
/// `sections` array.
pub fn feed_sections(assets: &AssetUrl) -> Vec<Stage> {
    let mut stages = vec![Stage::Unwind(
        Unwind::preserving("sections").with_index(SECTION_INDEX),
    )];
    stages.extend(image(assets, "sections.image", "sections.image"));
    stages.extend(course(assets, "sections.course", "sections.course"));
    stages.extend(book(assets, "sections.book", "sections.book"));
    stages.push(Stage::Sort(doc! { "_id": 1, "section_index": 1 }));

    let mut group = doc! {
        "_id": "$_id",
        "sections": { "$push": {
            "section": "$sections",
            "index": format!("${}", SECTION_INDEX),
        } },
    };
    for field in FEED_FIELDS {
        group.insert(field, doc! { "$first": format!("${}", field) });
    }
    stages.push(Stage::Group(group));
    stages.push(Stage::AddFields(regrouped_sections()));
    stages
}

fn regrouped_sections() -> Document {
    doc! {
        "sections": {
            "$map": {
                "input": {
                    "$filter": {
                        "input": "$sections",
                        "as": "entry",
                        "cond": { "$ne": [ { "$ifNull": ["$$entry.index", Bson::Null] }, Bson::Null ] },
                    }
                },
                "as": "entry",
                "in": "$$entry.section",
            }
        }
    }
}
