use std::fmt::Write as _;

use table_engine::format::display_cell;
use table_engine::{
    EntityConfig, FilterState, PageRequest, Selection, SortSpec, TableQuery, TableView,
};

use crate::config::{Effective, OutputFormat, QueryArgs};
use crate::error::ServerError;
use crate::source;

/// Один snapshot, один запрос, результат в stdout.
pub async fn run(args: QueryArgs) -> Result<(), ServerError> {
    let config = Effective::new(&args.source, None)?;
    let source = source::from_config(&config);
    let snapshot = source.load().await.map_err(ServerError::Source)?;

    let output = if args.stats {
        serde_json::to_string_pretty(&snapshot.stats(args.entity))?
    } else {
        let table = EntityConfig::for_kind(args.entity);
        let query = table_query(&args);
        query.validate(table)?;
        let view = snapshot.view(args.entity, &query);
        match args.format {
            OutputFormat::Json => serde_json::to_string_pretty(&view)?,
            OutputFormat::Text => render_text(table, &view),
        }
    };
    println!("{output}");
    Ok(())
}

fn table_query(args: &QueryArgs) -> TableQuery {
    TableQuery {
        filters: FilterState::from_pairs(args.filters.iter().cloned()),
        search: args.search.clone(),
        sort: args.sort.as_ref().map(|column| SortSpec {
            column: column.clone(),
            order: args.order,
        }),
        page: PageRequest::new(args.page, args.page_size),
        selected: Selection::from_ids(args.selected.iter().cloned()),
    }
}

/// Заголовок + строки страницы через таб, итог последней строкой.
fn render_text(config: &EntityConfig, view: &TableView) -> String {
    let mut out = String::new();
    let titles: Vec<&str> = config.columns.iter().map(|c| c.title).collect();
    out.push_str(&titles.join("\t"));
    out.push('\n');

    for row in &view.rows {
        let cells: Vec<String> = config
            .columns
            .iter()
            .map(|c| display_cell(c.key, row.cell(c.key)))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    let _ = write!(
        out,
        "page {}/{} ({} of {} rows, {} selected)",
        view.page + 1,
        view.page_count.max(1),
        view.filtered,
        view.total,
        view.selection.selected,
    );
    out
}
