use geo::{Geometry, Point};
use geojson::GeoJson;
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, warn};

use crate::error::{AtlasError, LookupError};

/// A state or union territory drawn as a point.
#[derive(Clone, Debug, PartialEq)]
pub struct RegionFeature {
    pub location: String,
    pub point: Point<f64>,
    /// Hint for the hover affordance, set on every loaded feature.
    pub pointer: bool,
}

/// Year → value pairs in the order they appear in the source file.
///
/// Chart labels follow this order, so the series is never sorted. A year
/// repeated inside one record keeps its first position and its last value,
/// which is how a JSON object with duplicate keys behaves in the browser.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct YearSeries(Vec<(String, f64)>);

impl YearSeries {
    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(year, _)| year.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().map(|(_, value)| *value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, year: String, value: f64) {
        match self.0.iter_mut().find(|(y, _)| *y == year) {
            Some(slot) => slot.1 = value,
            None => self.0.push((year, value)),
        }
    }
}

impl FromIterator<(String, f64)> for YearSeries {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut series = YearSeries::default();
        for (year, value) in iter {
            series.insert(year, value);
        }
        series
    }
}

impl<'de> Deserialize<'de> for YearSeries {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SeriesVisitor;

        impl<'de> Visitor<'de> for SeriesVisitor {
            type Value = YearSeries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "an object mapping year labels to numbers")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut series = YearSeries::default();
                while let Some((year, value)) = access.next_entry::<String, f64>()? {
                    series.insert(year, value);
                }
                Ok(series)
            }
        }

        deserializer.deserialize_map(SeriesVisitor)
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CoverRecord {
    pub location: String,
    pub data: YearSeries,
}

/// Forest cover time series for every region, loaded once.
#[derive(Clone, Debug, Default)]
pub struct ForestCover {
    records: Vec<CoverRecord>,
}

impl ForestCover {
    pub fn new(records: Vec<CoverRecord>) -> Self {
        Self { records }
    }

    pub fn parse(text: &str) -> Result<Self, AtlasError> {
        let records: Vec<CoverRecord> = serde_json::from_str(text)?;
        Ok(Self { records })
    }

    /// Exact, case-sensitive match on `location`. The first record wins.
    pub fn lookup(&self, location: &str) -> Result<&CoverRecord, LookupError> {
        self.records
            .iter()
            .find(|r| r.location == location)
            .ok_or_else(|| LookupError { location: location.to_string() })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Feature locations with no record, in feature order, without repeats.
    pub fn missing_locations(&self, features: &[RegionFeature]) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for feature in features {
            if self.lookup(&feature.location).is_err() && !missing.contains(&feature.location) {
                missing.push(feature.location.clone());
            }
        }
        missing
    }

    /// Checks that both static files agree on their join key.
    ///
    /// Mismatches are always logged. With `strict` they are returned as an
    /// error, otherwise the panel reports them when such a feature is clicked.
    pub fn verify_joins(&self, features: &[RegionFeature], strict: bool) -> Result<(), AtlasError> {
        let missing = self.missing_locations(features);
        if missing.is_empty() {
            return Ok(());
        }
        for location in &missing {
            warn!(%location, "feature has no forest cover record");
        }
        if strict {
            return Err(AtlasError::Integrity(missing));
        }
        Ok(())
    }
}

/// Parses a GeoJSON FeatureCollection of points tagged with `location`.
pub fn parse_features(text: &str) -> Result<Vec<RegionFeature>, AtlasError> {
    let GeoJson::FeatureCollection(fc) = GeoJson::from_str(text)? else {
        return Err(AtlasError::NotACollection);
    };

    let mut features = Vec::with_capacity(fc.features.len());
    for (index, feature) in fc.features.into_iter().enumerate() {
        let location = feature
            .property("location")
            .and_then(|v| v.as_str())
            .ok_or(AtlasError::MissingLocation { index })?
            .to_string();

        let gj = feature.geometry.ok_or(AtlasError::Geometry { index })?;
        let point = match Geometry::<f64>::try_from(gj.value)? {
            Geometry::Point(p) => p,
            _ => return Err(AtlasError::Geometry { index }),
        };

        features.push(RegionFeature { location, point, pointer: true });
    }
    Ok(features)
}

/// Loads both static files from the data directory.
pub struct DataCache {
    base: PathBuf,
}

impl DataCache {
    pub fn new<P: AsRef<Path>>(base: P) -> Self {
        Self { base: base.as_ref().to_path_buf() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn load_features(&self, file: &str) -> Result<Vec<RegionFeature>, AtlasError> {
        let txt = self.read(file)?;
        let features = parse_features(&txt)?;
        debug!(count = features.len(), file, "loaded region features");
        Ok(features)
    }

    pub fn load_dataset(&self, file: &str) -> Result<ForestCover, AtlasError> {
        let txt = self.read(file)?;
        let dataset = ForestCover::parse(&txt)?;
        debug!(records = dataset.len(), file, "loaded forest cover dataset");
        Ok(dataset)
    }

    fn read(&self, file: &str) -> Result<String, AtlasError> {
        let path = self.base.join(file);
        fs::read_to_string(&path).map_err(|source| AtlasError::Io { path, source })
    }
}
