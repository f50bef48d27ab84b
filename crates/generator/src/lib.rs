//! SEO artifact generation: sitemaps, robots.txt, per-route head
//! prerendering and the blog post sources they read from.

pub mod markup;
pub mod prerender;
pub mod robots;
pub mod sitemap;
pub mod source;
pub mod structured_data;

pub use prerender::{PrerenderReport, prerender_routes};
pub use robots::generate_robots_txt;
pub use sitemap::{SitemapOptions, SitemapSet, build_sitemaps};
pub use source::{JsonFileSource, PostSource, SupabaseSource};
