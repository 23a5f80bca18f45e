//! Solidity bindings for every contract the adapters talk to.

use alloy_sol_types::sol;

sol! {
    #[sol(rpc)]
    contract IERC20 {
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function balanceOf(address account) external view returns (uint256);
    }
}

sol! {
    /// Merkly gas refuel endpoint.
    contract MerklyRefuel {
        function estimateSendFee(uint16 dstChainId, bytes toAddress, bytes adapterParams)
            external view returns (uint256 nativeFee, uint256 zroFee);
        function bridgeGas(uint16 dstChainId, bytes toAddress, bytes adapterParams) external payable;
    }
}

sol! {
    /// STG token's OFT bridge surface.
    contract StargateToken {
        function estimateSendTokensFee(uint16 dstChainId, bool useZro, bytes txParameters)
            external view returns (uint256 nativeFee, uint256 zroFee);
        function sendTokens(
            uint16 dstChainId,
            bytes to,
            uint256 qty,
            address zroPaymentAddress,
            bytes adapterParam
        ) external payable;
    }
}

sol! {
    /// Core chain's LayerZero token bridge.
    contract CoreBridge {
        struct LzCallParams {
            address refundAddress;
            address zroPaymentAddress;
        }

        function estimateBridgeFee(bool useZro, bytes adapterParams)
            external view returns (uint256 nativeFee, uint256 zroFee);
        function bridge(
            address token,
            uint256 amountLD,
            address to,
            LzCallParams callParams,
            bytes adapterParams
        ) external payable;
    }
}
