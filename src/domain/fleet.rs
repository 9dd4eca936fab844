use serde::{Deserialize, Deserializer, Serialize};

// Raw coordinates are reported in millionths of a degree.
const MICRO_DEGREES: f64 = 1_000_000.0;

// Live or historical position report for one device.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceStatus {
    // Device number.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    // Plate number, when the device is bound to a vehicle.
    #[serde(deserialize_with = "loose_text")]
    pub vid: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub lng: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub lat: i64,
    // Map-projected coordinates, already in degrees.
    #[serde(deserialize_with = "null_as_default")]
    pub mlng: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mlat: String,
    // GPS upload time.
    #[serde(deserialize_with = "null_as_default")]
    pub gt: String,
    // 1 means online.
    #[serde(deserialize_with = "null_as_default")]
    pub ol: i64,
    // Geographic position description.
    #[serde(deserialize_with = "null_as_default")]
    pub ps: String,
    // Parking time in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pk: Option<i64>,
    // Network type: 0 3G, 1 WIFI, 2 wired, 3 4G, 4 5G.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub net: Option<i64>,
    // Satellite count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sn: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hx: Option<i64>,
    // Mileage in meters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lc: Option<i64>,
    // Fuel, hundredths of a unit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yl: Option<i64>,
    // Status bits; some firmware sends them as a number.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "loose_text"
    )]
    pub s1: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s2: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s3: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s4: Option<i64>,
}

impl DeviceStatus {
    pub fn latitude_degrees(&self) -> f64 {
        self.lat as f64 / MICRO_DEGREES
    }

    pub fn longitude_degrees(&self) -> f64 {
        self.lng as f64 / MICRO_DEGREES
    }

    pub fn is_online(&self) -> bool {
        self.ol == 1
    }
}

// Device record as returned by getDeviceByVehicle.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VendorDevice {
    #[serde(deserialize_with = "null_as_default")]
    pub vehi_idno: String,
    #[serde(deserialize_with = "null_as_default")]
    pub dev_idno: String,
    #[serde(deserialize_with = "null_as_default")]
    pub device_type: i64,
}

// Plate-to-device binding exposed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentifier {
    // Plate number.
    pub vid: String,
    // Device number.
    pub did: String,
    // 0 GPS, 1 video.
    #[serde(rename = "type")]
    pub device_type: i64,
}

impl From<VendorDevice> for DeviceIdentifier {
    fn from(device: VendorDevice) -> Self {
        Self {
            vid: device.vehi_idno,
            did: device.dev_idno,
            device_type: device.device_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Device {
    pub id: String,
    pub pid: i64,
    pub ic: i64,
    pub io: String,
    pub cc: i64,
    pub cn: String,
    pub tc: i64,
    pub tn: String,
    pub md: i64,
    pub sim: Option<String>,
}

// Vehicle as listed by queryUserVehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    pub id: i64,
    pub nm: String,
    pub dl: Vec<Device>,
    pub ic: i64,
    pub pid: i64,
    pub pnm: String,
    pub pt: String,
    #[serde(rename = "vehicleType")]
    pub vehicle_type: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceRef {
    pub id: String,
}

// Vehicle grouped from plate-to-device bindings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VehicleSummary {
    pub id: String,
    pub nm: String,
    pub dl: Vec<DeviceRef>,
    pub pnm: String,
}

// The vendor sends `null` for unset fields; treat it like an absent one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseText {
    Text(String),
    Integer(i64),
    Float(f64),
}

// Text field that may arrive as a JSON number.
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(
        Option::<LooseText>::deserialize(deserializer)?.map(|value| match value {
            LooseText::Text(text) => text,
            LooseText::Integer(number) => number.to_string(),
            LooseText::Float(number) => number.to_string(),
        }),
    )
}
