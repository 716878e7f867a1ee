pub mod db_cursor;
pub mod favicon;
pub mod icon_type;
pub mod identifiable;
pub mod page_metadata;
pub mod site;
pub mod site_index;
