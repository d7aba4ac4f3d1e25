pub const DRIVER_NAME: &str = "davfs-sync";

pub const XATTR_STATE: &str = "user.davfs.state";

pub const STATUS_ATTRIBUTE: &str = "davfs_sync_status";

pub const MENU_ITEM_INFO: &str = "DavfsSyncExtension::Info";

pub const DEFAULT_MOUNT_TABLE: &str = "/proc/mounts";
