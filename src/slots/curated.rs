use serde::Serialize;

use crate::context::CampaignType;

/// Which optional groups a curated-slot claim form shows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CuratedSlotLayout {
    pub area_visible: bool,
    pub mission_type_visible: bool,
}

impl CuratedSlotLayout {
    pub fn for_campaign(campaign_type: CampaignType) -> Self {
        Self {
            area_visible: campaign_type != CampaignType::Op,
            mission_type_visible: true,
        }
    }
}
