pub mod columns;
pub mod deserializers;
pub mod pipeline;
pub mod types;

pub use pipeline::{
    parse_activities_csv, parse_activities_reader, parse_tickets_csv, parse_tickets_reader,
    ParseOutput,
};
pub use types::{Activity, ParseWarning, Ticket};
