//! Static plant catalog: class names and medicinal uses.
//!
//! The array order defines the model's output-layer index mapping and
//! must stay in sync with the trained weights.

use crate::types::LabelSet;

/// One catalog entry: class name plus its traditional medicinal uses
#[derive(Debug, Clone, Copy)]
pub struct PlantProfile {
    /// Class name as produced by the model's label mapping
    pub name: &'static str,

    /// Traditional medicinal uses associated with this plant
    pub uses: [&'static str; 5],
}

/// All supported plants, in model output order.
pub static PLANT_PROFILES: [PlantProfile; 10] = [
    PlantProfile {
        name: "Bhibitaki",
        uses: [
            "Digestive health and bowel regulation",
            "Respiratory ailments like asthma and bronchitis",
            "Antioxidant properties for overall wellness",
            "Hair and skin health improvement",
            "Liver detoxification support",
        ],
    },
    PlantProfile {
        name: "Candelabra plant",
        uses: [
            "Treatment of skin conditions and wounds",
            "Anti-inflammatory properties",
            "Pain relief for joints and muscles",
            "Antimicrobial effects",
            "Traditional fever reduction",
        ],
    },
    PlantProfile {
        name: "Chebulic Myrobalan",
        uses: [
            "Powerful digestive aid and laxative",
            "Antioxidant and anti-aging properties",
            "Cardiovascular health support",
            "Immune system strengthening",
            "Mental clarity and memory enhancement",
        ],
    },
    PlantProfile {
        name: "Gotu Kola",
        uses: [
            "Brain function and memory improvement",
            "Wound healing and skin regeneration",
            "Anxiety and stress reduction",
            "Circulation enhancement",
            "Anti-inflammatory effects",
        ],
    },
    PlantProfile {
        name: "Holy Basil",
        uses: [
            "Stress reduction and adaptogenic properties",
            "Respiratory health and cough relief",
            "Blood sugar regulation",
            "Immune system support",
            "Anti-inflammatory and antioxidant effects",
        ],
    },
    PlantProfile {
        name: "Indian Borage",
        uses: [
            "Respiratory ailments like cold and cough",
            "Digestive disorders and stomach pain",
            "Skin conditions and wound healing",
            "Fever reduction",
            "Antimicrobial properties",
        ],
    },
    PlantProfile {
        name: "Lemongrass",
        uses: [
            "Digestive health and stomach disorders",
            "Antimicrobial and antifungal properties",
            "Anxiety and stress relief",
            "Pain and inflammation reduction",
            "Detoxification and cleansing",
        ],
    },
    PlantProfile {
        name: "Longevity Spinach",
        uses: [
            "Anti-aging and longevity promotion",
            "Blood sugar regulation",
            "Cardiovascular health support",
            "Antioxidant protection",
            "Immune system enhancement",
        ],
    },
    PlantProfile {
        name: "Madagascar Periwinkle",
        uses: [
            "Diabetes management and blood sugar control",
            "Cancer treatment support (vincristine/vinblastine)",
            "Wound healing properties",
            "Antimicrobial effects",
            "Blood pressure regulation",
        ],
    },
    PlantProfile {
        name: "Neem Tree",
        uses: [
            "Skin conditions and acne treatment",
            "Antimicrobial and antifungal properties",
            "Dental health and oral hygiene",
            "Immune system support",
            "Blood purification and detox",
        ],
    },
];

/// The label set used by every classifier in this service
pub fn label_set() -> LabelSet {
    LabelSet::new(PLANT_PROFILES.iter().map(|p| p.name.to_string()).collect())
}

/// Medicinal uses for the given plant name (exact match)
pub fn medicinal_uses(name: &str) -> Option<&'static [&'static str]> {
    PLANT_PROFILES
        .iter()
        .find(|p| p.name == name)
        .map(|p| p.uses.as_slice())
}
