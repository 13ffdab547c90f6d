mod extract_error;
mod page;

pub use extract_error::ExtractionError;
pub use page::{
    get_bath, get_bed_bath, get_bed_count, get_body, get_move_in_date, get_price, get_tags,
    get_url, parse_page, BedBath,
};
