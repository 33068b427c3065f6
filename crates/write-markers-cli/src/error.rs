use write_markers_core::layout::LayoutError;
use write_markers_core::markers::MarkerError;

use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display("Invalid marker layout: {source}"))]
    InvalidLayout { source: LayoutError },

    #[snafu(display("Failed to record marker for {partition}/{file} (instant {instant}): {source}"))]
    CreateMarker {
        instant: String,
        partition: String,
        file: String,
        #[snafu(source(from(MarkerError, Box::new)))]
        source: Box<MarkerError>,
    },

    #[snafu(display("Failed to list markers of instant {instant}: {source}"))]
    ListMarkers {
        instant: String,
        #[snafu(source(from(MarkerError, Box::new)))]
        source: Box<MarkerError>,
    },

    #[snafu(display(
        "Failed to access marker directory of instant {instant}. \
         Ensure the table path is readable: {source}"
    ))]
    MarkerDir {
        instant: String,
        #[snafu(source(from(MarkerError, Box::new)))]
        source: Box<MarkerError>,
    },
}
