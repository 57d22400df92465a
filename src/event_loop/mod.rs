
pub mod terminal_event_loop;

use std::io;

use hash_tables::{CollisionResolution, KeyValueTable};

pub trait EventLoop {
    fn run(
        &mut self,
        table: &mut dyn KeyValueTable<String, String>,
        strategy: CollisionResolution,
    ) -> io::Result<()>;
}
