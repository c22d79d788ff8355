pub struct Icons;

impl Icons {
    pub const MUSEUM: &str = "🏛️";
    pub const SEARCH: &str = "🔍";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const SCROLL: &str = "📜";
    pub const FRAME: &str = "🖼️";
    pub const PALETTE: &str = "🎨";
    pub const DEL: &str = "🗑️";
    pub const PACKAGE: &str = "📦";
    pub const DATABASE: &str = "🗄️";
    pub const GLOBE: &str = "🌍";
    pub const HOURGLASS: &str = "⏳";
    pub const GEAR: &str = "⚙️";
}
