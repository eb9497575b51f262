pub mod feed;
pub mod item;
pub mod pager;

pub use feed::{FeedKind, FreshnessCursor, Listing};
pub use item::{Item, ItemKind, RawItem};
pub use pager::{ChildPager, PAGE_SIZE};
