pub mod errors;
mod models;

use std::str::FromStr;
use std::sync::Mutex;
use std::time::Duration;
use chrono::Utc;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use ureq::Agent;
use ureq::http::{HeaderMap, HeaderName, HeaderValue};
use crate::config::FoxESS;
use crate::manager_fox_cloud::errors::FoxError;
use crate::manager_fox_cloud::models::{
    DeviceRealTimeResult, RequestRealTimeData, RequestSetDeviceSetting, RequestSetScheduler, SchedulerSegment,
};
use crate::ports::InverterController;
use crate::projector::Mode;

const REQUEST_DOMAIN: &str = "https://www.foxesscloud.com";

/// FoxESS Cloud adapter implementing the `InverterController` port over the signed
/// FoxESS Open API. TOU segments are written one at a time through the port, but the
/// scheduler endpoint takes the whole group list, so the adapter keeps the last-known
/// group list in memory and re-POSTs it in full on every `set_tou_segment` call.
pub struct Fox {
    api_key: String,
    sn: String,
    agent: Agent,
    max_tou_segments: usize,
    groups: Mutex<Vec<Option<SchedulerSegment>>>,
}

impl Fox {
    /// Returns a new instance of the Fox struct
    ///
    /// # Arguments
    ///
    /// * 'config' - FoxESS Cloud connection parameters (api key, inverter serial, TOU cap)
    pub fn new(config: &FoxESS) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(30)))
            .build();

        let agent = agent_config.into();

        Self {
            api_key: config.api_key.to_string(),
            sn: config.inverter_sn.to_string(),
            agent,
            max_tou_segments: config.max_tou_segments,
            groups: Mutex::new(vec![None; config.max_tou_segments]),
        }
    }

    /// Get the battery current soc (state of charge) and soh (state of health)
    ///
    /// See https://www.foxesscloud.com/public/i18n/en/OpenApiDocument.html#get20device20real-time20data0a3ca20id3dget20device20real-time20data5603e203ca3e
    pub fn get_current_soc_soh(&self) -> Result<(u8, u8), FoxError> {
        let data = self.get_real_time(&["SoC", "SOH"])?;
        Ok((
            *data.get("SoC").unwrap_or(&0.0) as u8,
            *data.get("SOH").unwrap_or(&0.0) as u8,
        ))
    }

    /// Queries one or more real-time device variables, returning them keyed by variable name.
    fn get_real_time(&self, variables: &[&str]) -> Result<std::collections::HashMap<String, f64>, FoxError> {
        let path = "/op/v1/device/real/query";

        let req = RequestRealTimeData {
            sn: self.sn.clone(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
        };
        let req_json = serde_json::to_string(&req)
            .map_err(|e| FoxError::GetError("real_time_query", e.to_string()))?;

        let json = self.post_request(path, req_json)?;

        let fox_data: DeviceRealTimeResult = serde_json::from_str(&json)
            .map_err(|e| FoxError::GetError("real_time_query", e.to_string()))?;

        let mut out = std::collections::HashMap::new();
        if let Some(first) = fox_data.result.into_iter().next() {
            for data in first.datas {
                out.insert(data.variable, data.value);
            }
        }

        Ok(out)
    }

    fn get_one(&self, variable: &'static str) -> Result<f64, FoxError> {
        self.get_real_time(&[variable])?
            .get(variable)
            .copied()
            .ok_or(FoxError::GetError(variable, "variable missing from response".to_string()))
    }

    /// Writes a single named device setting, e.g. `"GridChargePowerRate"` or
    /// `"ExportLimit"`, the pattern FoxESS uses for every scalar inverter setting.
    fn set_one(&self, key: &'static str, value: String) -> Result<(), FoxError> {
        let path = "/op/v1/device/setting/set";
        let req = RequestSetDeviceSetting { sn: self.sn.clone(), key: key.to_string(), value };
        let req_json = serde_json::to_string(&req).map_err(|e| FoxError::SetError(key, e.to_string()))?;
        self.post_request(path, req_json)?;
        Ok(())
    }

    fn push_scheduler_groups(&self) -> Result<(), FoxError> {
        let groups = self.groups.lock().unwrap();
        let segments: Vec<SchedulerSegment> = groups
            .iter()
            .filter_map(|g| g.clone())
            .collect();
        drop(groups);

        let path = "/op/v1/device/scheduler/set";
        let req = RequestSetScheduler { sn: self.sn.clone(), groups: segments };
        let req_json = serde_json::to_string(&req).map_err(|e| FoxError::SetError("scheduler", e.to_string()))?;
        self.post_request(path, req_json)?;
        Ok(())
    }

    /// Builds a request and sends it as a POST.
    /// The return is the JSON representation of the result as specified by
    ///  the respective FoxESS API
    ///
    /// # Arguments
    ///
    /// * path - the API path excluding the domain
    /// * body - a string containing the payload in JSON format
    fn post_request(&self, path: &str, body: String) -> Result<String, FoxError> {
        let url = format!("{}{}", REQUEST_DOMAIN, path);

        let mut req = self.agent.post(url);
        let headers = req.headers_mut().ok_or(FoxError::PostRequestError("request builder error".to_string()))?;
        self.generate_headers(headers, path, Some(vec![("Content-Type", "application/json")]));

        let json = req
            .send(body)
            .map_err(|e| FoxError::PostRequestError(format!("ureq error: {}", e)))?
            .body_mut()
            .read_to_string()
            .map_err(|e| FoxError::PostRequestError(format!("ureq error: {}", e)))?;

        let fox_res: FoxResponse = serde_json::from_str(&json)
            .map_err(|e| FoxError::PostRequestError(format!("error deserializing response: {}", e)))?;

        if fox_res.errno != 0 {
            return Err(FoxError::PostRequestError(format!("errno: {}, msg: {}", fox_res.errno, fox_res.msg)));
        }

        Ok(json)
    }

    /// Generates http headers required by Fox Open API; this includes also building a
    /// md5 hashed signature.
    ///
    /// # Arguments
    ///
    /// * 'headers' - a header map to insert new headers into
    /// * 'path' - the path, excluding the domain part, to the FoxESS specific API
    /// * 'extra' - any extra headers to add besides FoxCloud standards
    fn generate_headers(&self, headers: &mut HeaderMap, path: &str, extra: Option<Vec<(&str, &str)>>) {
        let timestamp = Utc::now().timestamp() * 1000;
        let signature = format!("{}\\r\\n{}\\r\\n{}", path, self.api_key, timestamp);

        let mut hasher = Md5::new();
        hasher.update(signature.as_bytes());
        let signature_md5 = hasher.finalize().iter().map(|x| format!("{:02x}", x)).collect::<String>();

        headers.insert("token", HeaderValue::from_str(&self.api_key).unwrap());
        headers.insert("timestamp", HeaderValue::from_str(&timestamp.to_string()).unwrap());
        headers.insert("signature", HeaderValue::from_str(&signature_md5).unwrap());
        headers.insert("lang", HeaderValue::from_str("en").unwrap());

        if let Some(h) = extra {
            h.iter().for_each(|&(k, v)| {
                headers.insert(HeaderName::from_str(k).unwrap(), HeaderValue::from_str(v).unwrap());
            });
        }
    }
}

fn mode_to_work_mode(mode: Mode) -> &'static str {
    match mode {
        Mode::BatteryFirst => "ForceCharge",
        Mode::LoadFirst => "ForceDischarge",
    }
}

fn parse_hhmm(hhmm: &str) -> Option<(u8, u8)> {
    let (h, m) = hhmm.split_once(':')?;
    Some((h.parse().ok()?, m.parse().ok()?))
}

#[derive(Serialize, Deserialize)]
struct FoxResponse {
    errno: u32,
    msg: String,
}

impl InverterController for Fox {
    type Error = FoxError;

    fn battery_soc_pct(&self) -> Result<f64, Self::Error> {
        self.get_one("SoC")
    }

    fn grid_charge_enabled(&self) -> Result<bool, Self::Error> {
        Ok(self.get_one("GridChargeEnable")? != 0.0)
    }

    fn charging_power_rate_pct(&self) -> Result<u8, Self::Error> {
        Ok(self.get_one("GridChargePowerRate")?.round() as u8)
    }

    fn discharging_power_rate_pct(&self) -> Result<u8, Self::Error> {
        Ok(self.get_one("DischargePowerRate")?.round() as u8)
    }

    fn charge_stop_soc_pct(&self) -> Result<u8, Self::Error> {
        Ok(self.get_one("MaxSoC")?.round() as u8)
    }

    fn discharge_stop_soc_pct(&self) -> Result<u8, Self::Error> {
        Ok(self.get_one("MinSoC")?.round() as u8)
    }

    fn l1_current_a(&self) -> Result<f64, Self::Error> {
        self.get_one("RCurrent")
    }

    fn l2_current_a(&self) -> Result<f64, Self::Error> {
        self.get_one("SCurrent")
    }

    fn l3_current_a(&self) -> Result<f64, Self::Error> {
        self.get_one("TCurrent")
    }

    fn current_grid_import_kw(&self) -> Result<f64, Self::Error> {
        self.get_one("GridConsumptionPower")
    }

    fn set_grid_charge(&self, enabled: bool) -> Result<(), Self::Error> {
        self.set_one("GridChargeEnable", if enabled { "1".to_string() } else { "0".to_string() })
    }

    fn set_charging_power_rate_pct(&self, pct: u8) -> Result<(), Self::Error> {
        self.set_one("GridChargePowerRate", pct.to_string())
    }

    fn set_discharging_power_rate_pct(&self, pct: u8) -> Result<(), Self::Error> {
        self.set_one("DischargePowerRate", pct.to_string())
    }

    fn set_charge_stop_soc_pct(&self, pct: u8) -> Result<(), Self::Error> {
        self.set_one("MaxSoC", pct.to_string())
    }

    fn set_discharge_stop_soc_pct(&self, pct: u8) -> Result<(), Self::Error> {
        self.set_one("MinSoC", pct.to_string())
    }

    fn set_tou_segment(
        &self,
        id: u32,
        mode: Mode,
        start_hhmm: &str,
        end_hhmm: &str,
        enabled: bool,
    ) -> Result<(), Self::Error> {
        let slot = (id as usize)
            .checked_sub(1)
            .filter(|i| *i < self.max_tou_segments)
            .ok_or(FoxError::SetError("scheduler", format!("segment id {} out of range", id)))?;

        let (start_hour, start_minute) = parse_hhmm(start_hhmm)
            .ok_or(FoxError::SetError("scheduler", format!("invalid start time {}", start_hhmm)))?;
        let (end_hour, end_minute) = parse_hhmm(end_hhmm)
            .ok_or(FoxError::SetError("scheduler", format!("invalid end time {}", end_hhmm)))?;

        let segment = SchedulerSegment {
            enable: enabled as u8,
            start_hour,
            start_minute,
            end_hour,
            end_minute,
            work_mode: mode_to_work_mode(mode).to_string(),
            fd_soc: 10,
            fd_pwr: 0,
        };

        self.groups.lock().unwrap()[slot] = Some(segment);
        self.push_scheduler_groups()
    }

    fn disable_all_tou_segments(&self) -> Result<(), Self::Error> {
        {
            let mut groups = self.groups.lock().unwrap();
            groups.iter_mut().for_each(|g| *g = None);
        }
        self.push_scheduler_groups()
    }
}
