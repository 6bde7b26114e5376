use trix::auth::CodeSource;
use trix::sheets::RangeValues;
use trix::{AppError, Result, Settings, SpreadsheetClient};
use tracing::info;

pub async fn get(
    settings: &Settings,
    code_source: Box<dyn CodeSource>,
    spreadsheet_id: &str,
    range: &str,
) -> Result<()> {
    let client = SpreadsheetClient::connect(spreadsheet_id, settings, code_source).await?;
    let values = client.get(range).await?;

    println!("{}", serde_json::to_string_pretty(&values)?);

    Ok(())
}

pub async fn update(
    settings: &Settings,
    code_source: Box<dyn CodeSource>,
    spreadsheet_id: &str,
    range: &str,
    values: &str,
) -> Result<()> {
    let values = parse_rows(values)?;
    let client = SpreadsheetClient::connect(spreadsheet_id, settings, code_source).await?;
    let response = client.update(range, values).await?;

    info!(
        range = response.updated_range.as_deref().unwrap_or(range),
        cells = response.updated_cells.unwrap_or_default(),
        "Range updated"
    );

    Ok(())
}

pub async fn append(
    settings: &Settings,
    code_source: Box<dyn CodeSource>,
    spreadsheet_id: &str,
    cells: &[String],
) -> Result<()> {
    let row = cells
        .iter()
        .map(|cell| serde_json::Value::String(cell.clone()))
        .collect();
    let client = SpreadsheetClient::connect(spreadsheet_id, settings, code_source).await?;
    let response = client.append_row(vec![row]).await?;

    info!(
        range = response.updated_range.as_deref().unwrap_or_default(),
        url = client.spreadsheet_url(),
        "Row appended"
    );

    Ok(())
}

fn parse_rows(values: &str) -> Result<RangeValues> {
    serde_json::from_str(values).map_err(|e| {
        AppError::Config(format!("Values must be a JSON array of rows: {}", e))
    })
}
