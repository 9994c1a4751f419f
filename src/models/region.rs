// src/models/region.rs

use serde::Serialize;

/// A point on the map, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Map center used when a profile's province is unknown (Bangkok).
pub const DEFAULT_CENTER: LatLng = LatLng {
    lat: 13.7563,
    lng: 100.5018,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Province {
    pub id: u32,
    pub name: &'static str,
    /// First two digits shared by the province's postal codes.
    pub zip_code_base: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Province {
    pub fn centroid(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lng: self.lng,
        }
    }

    /// Postal code assigned to profiles in this province.
    pub fn postal_code(&self) -> String {
        format!("{}000", self.zip_code_base)
    }
}

#[derive(Debug, Serialize)]
pub struct Region {
    pub id: u32,
    pub name: &'static str,
    pub provinces: &'static [Province],
}

const fn province(
    id: u32,
    name: &'static str,
    zip_code_base: &'static str,
    lat: f64,
    lng: f64,
) -> Province {
    Province {
        id,
        name,
        zip_code_base,
        lat,
        lng,
    }
}

/// Static reference data, grouped by region.
pub static REGIONS: &[Region] = &[
    Region {
        id: 1,
        name: "ภาคเหนือ",
        provinces: &[
            province(1, "เชียงใหม่", "50", 18.7883, 98.9853),
            province(2, "เชียงราย", "57", 19.9105, 99.8406),
            province(3, "ลำปาง", "52", 18.2888, 99.5207),
            province(4, "น่าน", "55", 18.7830, 100.7719),
            province(5, "แม่ฮ่องสอน", "58", 19.3020, 97.9654),
        ],
    },
    Region {
        id: 2,
        name: "ภาคกลาง",
        provinces: &[
            province(21, "กรุงเทพมหานคร", "10", 13.7563, 100.5018),
            province(22, "นนทบุรี", "11", 13.8591, 100.5217),
            province(23, "ปทุมธานี", "12", 14.0208, 100.5250),
            province(24, "พระนครศรีอยุธยา", "13", 14.3585, 100.5760),
            province(25, "สมุทรปราการ", "10", 13.5991, 100.5968),
        ],
    },
    Region {
        id: 3,
        name: "ภาคอีสาน",
        provinces: &[
            province(31, "ขอนแก่น", "40", 16.4322, 102.8236),
            province(32, "นครราชสีมา", "30", 14.9759, 102.1000),
            province(33, "อุดรธานี", "41", 17.4138, 102.7872),
            province(34, "อุบลราชธานี", "34", 15.2448, 104.8473),
            province(35, "บุรีรัมย์", "31", 14.9930, 103.1029),
        ],
    },
    Region {
        id: 4,
        name: "ภาคใต้",
        provinces: &[
            province(41, "ภูเก็ต", "83", 7.8804, 98.3923),
            province(42, "สงขลา", "90", 7.1981, 100.5951),
            province(43, "สุราษฎร์ธานี", "84", 9.1389, 99.3126),
            province(44, "กระบี่", "81", 8.0863, 98.9063),
            province(45, "นครศรีธรรมราช", "80", 8.4309, 99.9631),
        ],
    },
];

/// Looks up a province by name together with its region.
pub fn find_province(name: &str) -> Option<(&'static Region, &'static Province)> {
    REGIONS.iter().find_map(|region| {
        region
            .provinces
            .iter()
            .find(|p| p.name == name)
            .map(|p| (region, p))
    })
}
